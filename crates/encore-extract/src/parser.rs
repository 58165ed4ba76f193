//! Body parser dispatch.
//!
//! The declared content type decides the strategy: URL-encoded form fields
//! through [`FromFormFields`], JSON through `serde`, and anything else yields
//! `None` without reading the body. Decoding failures are logged at `debug`
//! and also yield `None`.

use crate::album::AlbumForm;
use crate::body::{read_body, DEFAULT_MAX_BODY_SIZE};
use crate::error::{ExtractionError, ExtractionSource};
use crate::form::{FormFields, FromFormFields};
use crate::media::BodyFormat;
use bytes::Bytes;
use encore_core::Task;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

/// Decodes `bytes` as `T` using `format`.
///
/// # Errors
///
/// Returns an [`ExtractionError`] describing the first problem found.
pub fn decode<T>(format: BodyFormat, bytes: &[u8]) -> Result<T, ExtractionError>
where
    T: FromFormFields + DeserializeOwned,
{
    match format {
        BodyFormat::Form => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                ExtractionError::deserialization_failed(ExtractionSource::Form, e.to_string())
            })?;
            T::from_form_fields(&FormFields::parse(text)?)
        }
        BodyFormat::Json => serde_json::from_slice(bytes).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Json, e.to_string())
        }),
        BodyFormat::Unsupported => Err(ExtractionError::unsupported_media_type(None)),
    }
}

/// Reads typed input from the request body.
///
/// A parser owns one memoized body read, so every form read through the same
/// parser (or a clone of it) shares the bytes. Build one parser per pipeline.
///
/// # Example
///
/// ```rust
/// use encore_core::RequestEnv;
/// use encore_extract::BodyParser;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let parser = BodyParser::default();
/// let env = RequestEnv::builder()
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("Title=Foo&ArtistId=1&GenreId=2&Price=9.99&ArtUrl=http://x")
///     .build();
///
/// let album = parser.read_album().run(&env).await.unwrap().unwrap();
/// assert_eq!(album.title, "Foo");
/// assert_eq!(album.album_art_url, "http://x");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BodyParser {
    max_bytes: usize,
    raw: Task<Option<Bytes>>,
    album: Task<Option<AlbumForm>>,
}

impl BodyParser {
    /// Creates a parser that refuses bodies larger than `max_bytes`.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        let raw = read_body(max_bytes);
        let album = dispatch::<AlbumForm>(&raw).memo();
        Self {
            max_bytes,
            raw,
            album,
        }
    }

    /// Returns the configured body limit.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// The memoized album submission read.
    pub fn read_album(&self) -> Task<Option<AlbumForm>> {
        self.album.clone()
    }

    /// A memoized read of any form shape.
    ///
    /// Each call returns a new handle; keep it if the value is needed twice.
    /// The body itself is still read only once.
    pub fn read_form<T>(&self) -> Task<Option<T>>
    where
        T: FromFormFields + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        dispatch::<T>(&self.raw).memo()
    }
}

impl Default for BodyParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_SIZE)
    }
}

fn dispatch<T>(raw: &Task<Option<Bytes>>) -> Task<Option<T>>
where
    T: FromFormFields + DeserializeOwned + Send + 'static,
{
    let raw = raw.clone();
    Task::from_async(move |env| {
        let raw = raw.clone();
        Box::pin(async move {
            let content_type = env.header(CONTENT_TYPE.as_str());
            let format = BodyFormat::classify(content_type);
            if !format.is_supported() {
                tracing::debug!(
                    request_id = %env.request_id(),
                    content_type = content_type.unwrap_or("none"),
                    "body not read: unsupported content type"
                );
                return Ok(None);
            }

            let Some(bytes) = raw.run(env).await? else {
                return Ok(None);
            };

            match decode::<T>(format, &bytes) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    tracing::debug!(
                        request_id = %env.request_id(),
                        error_code = err.error_code(),
                        field = err.field(),
                        "body rejected: {err}"
                    );
                    Ok(None)
                }
            }
        })
    })
}
