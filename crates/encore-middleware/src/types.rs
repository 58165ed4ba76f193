//! Common types used throughout the middleware chain.

use bytes::Bytes;
use encore_core::ResponseParts;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;

pub use encore_render::Response;

/// Extension trait for building plain responses.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status and message.
    fn error(status: StatusCode, message: &str) -> Response;

    /// Adds the headers and cookies accumulated in `parts`.
    ///
    /// A status override in `parts` is ignored.
    fn with_parts(self, parts: &ResponseParts) -> Response;
}

impl ResponseExt for Response {
    fn error(status: StatusCode, message: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(message.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn with_parts(mut self, parts: &ResponseParts) -> Response {
        parts.apply_to(self.headers_mut());
        self
    }
}
