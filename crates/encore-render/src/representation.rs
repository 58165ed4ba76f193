//! The final wire payload and its metadata.

use bytes::Bytes;
use encore_core::{EncoreError, EncoreResult, ResponseParts};
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use mime::Mime;

/// The HTTP response type produced from a representation.
pub type Response = http::Response<Full<Bytes>>;

/// Charset tag used for every text representation.
pub const UTF_8: &str = "utf-8";

/// A rendered body plus the metadata negotiated for it.
///
/// # Example
///
/// ```rust
/// use encore_core::ResponseParts;
/// use encore_render::Representation;
/// use http::StatusCode;
///
/// let rep = Representation::json(br#"{"id":1}"#.to_vec());
/// assert_eq!(rep.content_type(), "application/json; charset=utf-8");
///
/// let response = rep.into_response(StatusCode::OK, &ResponseParts::default()).unwrap();
/// assert_eq!(response.headers()["content-type"], "application/json; charset=utf-8");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    data: Bytes,
    media_type: Mime,
    charset: Option<String>,
    encodings: Vec<String>,
    languages: Vec<String>,
}

impl Representation {
    /// Creates a representation with no charset, encodings, or languages.
    #[must_use]
    pub fn new(data: impl Into<Bytes>, media_type: Mime) -> Self {
        Self {
            data: data.into(),
            media_type,
            charset: None,
            encodings: Vec::new(),
            languages: Vec::new(),
        }
    }

    /// A UTF-8 JSON representation.
    #[must_use]
    pub fn json(data: impl Into<Bytes>) -> Self {
        Self::new(data, mime::APPLICATION_JSON).with_charset(UTF_8)
    }

    /// A UTF-8 HTML representation.
    #[must_use]
    pub fn html(markup: impl Into<String>) -> Self {
        Self::new(markup.into(), mime::TEXT_HTML).with_charset(UTF_8)
    }

    /// Sets the charset tag.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Adds a content encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encodings.push(encoding.into());
        self
    }

    /// Adds a content language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the body as text, if it is valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Returns the media type.
    #[must_use]
    pub fn media_type(&self) -> &Mime {
        &self.media_type
    }

    /// Returns the charset tag.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Returns the content encodings.
    #[must_use]
    pub fn encodings(&self) -> &[String] {
        &self.encodings
    }

    /// Returns the content languages.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> String {
        match &self.charset {
            Some(charset) => format!("{}; charset={charset}", self.media_type.essence_str()),
            None => self.media_type.essence_str().to_string(),
        }
    }

    /// Builds the HTTP response, adding everything accumulated in `parts`.
    ///
    /// A status override in `parts` wins over `status`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a header value is not valid.
    pub fn into_response(self, status: StatusCode, parts: &ResponseParts) -> EncoreResult<Response> {
        let mut builder = http::Response::builder()
            .status(parts.status.unwrap_or(status))
            .header(header::CONTENT_TYPE, self.content_type());

        if !self.encodings.is_empty() {
            builder = builder.header(header::CONTENT_ENCODING, self.encodings.join(", "));
        }
        if !self.languages.is_empty() {
            builder = builder.header(header::CONTENT_LANGUAGE, self.languages.join(", "));
        }

        let mut response = builder
            .body(Full::new(self.data))
            .map_err(|e| EncoreError::internal(format!("failed to build response: {e}")))?;
        parts.apply_to(response.headers_mut());
        Ok(response)
    }
}

/// Builds a plain-text response for an error that reached the transport.
///
/// The request id is echoed so the failure can be found in the logs.
#[must_use]
pub fn error_response(error: &EncoreError, request_id: impl std::fmt::Display) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(format!(
        "{} ({request_id})",
        error.error_code()
    ))));
    *response.status_mut() = error.status_code();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_type() {
        let rep = Representation::html("<p>hi</p>");
        assert_eq!(rep.media_type(), &mime::TEXT_HTML);
        assert_eq!(rep.charset(), Some("utf-8"));
        assert_eq!(rep.content_type(), "text/html; charset=utf-8");
        assert_eq!(rep.text(), Some("<p>hi</p>"));
    }

    #[test]
    fn test_response_carries_cookies_and_metadata() {
        let mut parts = ResponseParts::default();
        parts.set_cookies.push("cartId=1; Path=/".to_string());

        let response = Representation::html("x")
            .with_language("en")
            .with_encoding("identity")
            .into_response(StatusCode::OK, &parts)
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::SET_COOKIE], "cartId=1; Path=/");
        assert_eq!(response.headers()[header::CONTENT_LANGUAGE], "en");
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "identity");
    }

    #[test]
    fn test_status_override_wins() {
        let parts = ResponseParts {
            status: Some(StatusCode::CREATED),
            ..ResponseParts::default()
        };
        let response = Representation::json("{}")
            .into_response(StatusCode::OK, &parts)
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_error_response_status() {
        let err = EncoreError::unsupported_representation("text/csv");
        let response = error_response(&err, "req-1");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
