//! Extraction error types.
//!
//! An [`ExtractionError`] describes why a piece of request input could not be
//! turned into a typed value. The pipeline never aborts on one: body dispatch
//! logs it at `debug` and yields `None`.

use std::fmt;

/// Source of extraction (where data was being extracted from).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// URL-encoded form body
    Form,
    /// JSON body
    Json,
    /// Raw request body
    Body,
    /// Request cookies
    Cookie,
    /// Content-Type header specifically
    ContentType,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Json => write!(f, "json"),
            Self::Body => write!(f, "body"),
            Self::Cookie => write!(f, "cookie"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// Error that occurs during extraction.
///
/// # Example
///
/// ```rust
/// use encore_extract::{ExtractionError, ExtractionSource};
///
/// let err = ExtractionError::missing(ExtractionSource::Form, "ArtistId");
/// assert_eq!(err.error_code(), "MISSING_FIELD");
/// assert_eq!(err.extraction_source(), ExtractionSource::Form);
/// assert!(err.to_string().contains("ArtistId"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Required field is missing
    Missing,
    /// Value has invalid type or format
    InvalidType,
    /// Deserialization failed
    DeserializationFailed,
    /// Body is too large
    PayloadTooLarge,
    /// Content-Type is unsupported
    UnsupportedMediaType,
}

impl ExtractionError {
    /// Creates an error for a missing field.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} field: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for an invalid type or format.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} field '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for deserialization failure.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// Creates an error for a body over the configured limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes"),
            field: None,
        }
    }

    /// Creates an error for an unsupported content type.
    #[must_use]
    pub fn unsupported_media_type(actual: Option<&str>) -> Self {
        let actual_str = actual.unwrap_or("none");
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!(
                "unsupported content type: expected form or json, got '{actual_str}'"
            ),
            field: None,
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_FIELD",
            ExtractionErrorKind::InvalidType => "INVALID_FIELD",
            ExtractionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ExtractionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ExtractionError::missing(ExtractionSource::Form, "Title");

        assert_eq!(err.extraction_source(), ExtractionSource::Form);
        assert_eq!(err.field(), Some("Title"));
        assert_eq!(err.error_code(), "MISSING_FIELD");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_invalid_type_error() {
        let err = ExtractionError::invalid_type(ExtractionSource::Form, "Price", "not a decimal");

        assert_eq!(err.field(), Some("Price"));
        assert_eq!(err.error_code(), "INVALID_FIELD");
        assert!(err.to_string().contains("not a decimal"));
    }

    #[test]
    fn test_payload_too_large_error() {
        let err = ExtractionError::payload_too_large(1024);

        assert_eq!(err.extraction_source(), ExtractionSource::Body);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_unsupported_media_type_error() {
        let err = ExtractionError::unsupported_media_type(Some("text/plain"));

        assert_eq!(err.extraction_source(), ExtractionSource::ContentType);
        assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
        assert!(err.to_string().contains("text/plain"));

        let absent = ExtractionError::unsupported_media_type(None);
        assert!(absent.to_string().contains("none"));
    }

    #[test]
    fn test_extraction_source_display() {
        assert_eq!(ExtractionSource::Form.to_string(), "form");
        assert_eq!(ExtractionSource::Json.to_string(), "json");
        assert_eq!(ExtractionSource::Body.to_string(), "body");
        assert_eq!(ExtractionSource::ContentType.to_string(), "content-type");
    }
}
