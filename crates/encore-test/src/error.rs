//! Test error types.

use thiserror::Error;

/// Errors raised by the test helpers.
#[derive(Debug, Error)]
pub enum TestError {
    /// Reading a response body failed.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
