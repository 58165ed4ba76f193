//! Content-type classification for request bodies.

use mime::Mime;

/// How a request body should be decoded, decided from its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// `application/x-www-form-urlencoded`
    Form,
    /// `application/json` or any `+json` structured syntax suffix
    Json,
    /// Anything else, including an absent or unparsable content type
    Unsupported,
}

impl BodyFormat {
    /// Classifies a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use encore_extract::BodyFormat;
    ///
    /// assert_eq!(BodyFormat::classify(Some("application/json; charset=utf-8")), BodyFormat::Json);
    /// assert_eq!(BodyFormat::classify(Some("application/vnd.api+json")), BodyFormat::Json);
    /// assert_eq!(BodyFormat::classify(Some("application/x-www-form-urlencoded")), BodyFormat::Form);
    /// assert_eq!(BodyFormat::classify(Some("text/plain")), BodyFormat::Unsupported);
    /// assert_eq!(BodyFormat::classify(None), BodyFormat::Unsupported);
    /// ```
    #[must_use]
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(mime) = content_type.and_then(|ct| ct.parse::<Mime>().ok()) else {
            return Self::Unsupported;
        };

        if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Self::Form
        } else if mime.type_() == mime::APPLICATION
            && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
        {
            Self::Json
        } else {
            Self::Unsupported
        }
    }

    /// Returns true if the body should be read at all.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}
