//! Error types for Encore.
//!
//! [`EncoreError`] is the single failure type carried by a [`Task`](crate::Task).
//! It is `Clone` because memoized tasks replay their cached outcome, failures
//! included, to every later reader within the same request.
//!
//! Parse failures and missing claims are *not* errors: they are recovered into
//! `Option`/`bool` values close to where they happen. What remains here is the
//! set of failures that abort the request and reach the transport layer.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`EncoreError`].
pub type EncoreResult<T> = Result<T, EncoreError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request body could not be read from the transport.
    Body,
    /// The authentication collaborator failed (not "no identity").
    Authentication,
    /// Server configuration bug, e.g. an unsupported representation.
    Configuration,
    /// The store or the template engine failed.
    Upstream,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Body => StatusCode::BAD_REQUEST,
            Self::Upstream => StatusCode::BAD_GATEWAY,
            Self::Authentication | Self::Configuration | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error type for Encore.
///
/// # Example
///
/// ```
/// use encore_core::{EncoreError, ErrorCategory};
///
/// let err = EncoreError::upstream("store", anyhow::anyhow!("connection refused"));
/// assert_eq!(err.category(), ErrorCategory::Upstream);
/// assert!(err.to_string().contains("connection refused"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncoreError {
    /// The one-shot body handle was already taken by an earlier reader.
    #[error("request body was already consumed")]
    BodyConsumed,

    /// Reading the body from the transport failed.
    #[error("failed to read request body: {message}")]
    BodyRead {
        /// Transport error description.
        message: String,
    },

    /// The authentication collaborator failed.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// A handler was asked to render a media type outside JSON and HTML.
    #[error("unsupported representation: {media_type}")]
    UnsupportedRepresentation {
        /// The negotiated media type that cannot be produced.
        media_type: String,
    },

    /// An external collaborator (store, template engine) failed.
    #[error("{collaborator} failed: {message}")]
    Upstream {
        /// Which collaborator failed.
        collaborator: String,
        /// The collaborator's error chain, flattened.
        message: String,
    },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl EncoreError {
    /// Creates a body read error.
    #[must_use]
    pub fn body_read(message: impl Into<String>) -> Self {
        Self::BodyRead {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an unsupported representation error.
    #[must_use]
    pub fn unsupported_representation(media_type: impl Into<String>) -> Self {
        Self::UnsupportedRepresentation {
            media_type: media_type.into(),
        }
    }

    /// Wraps a collaborator failure. The full `anyhow` chain is kept in the message.
    pub fn upstream(collaborator: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Upstream {
            collaborator: collaborator.into(),
            message: format!("{:#}", source.into()),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BodyConsumed | Self::BodyRead { .. } => ErrorCategory::Body,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::UnsupportedRepresentation { .. } => ErrorCategory::Configuration,
            Self::Upstream { .. } => ErrorCategory::Upstream,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BodyConsumed => "BODY_CONSUMED",
            Self::BodyRead { .. } => "BODY_READ_FAILED",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::UnsupportedRepresentation { .. } => "UNSUPPORTED_REPRESENTATION",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
