//! # Encore Extract
//!
//! Reading typed input out of a request for the Encore pipeline.
//!
//! | Item | Source | Description |
//! |------|--------|-------------|
//! | [`Session`] | authenticator | Memoized identity, `is_authenticated`, `is_admin`, sign-in/out |
//! | [`cookie::get_cookie`] | `Cookie` header | Request-time cookie value |
//! | [`BodyParser`] | body | Form or JSON body into a typed value, read once |
//! | [`Negotiation`] | `Accept` header | Ordered acceptable media types |
//!
//! ## Failure model
//!
//! Malformed input never aborts a request. Missing fields, bad numbers, bad
//! JSON, unknown content types and oversized bodies all come back as `None`
//! with the [`ExtractionError`] logged (`warn` for oversized bodies, `debug`
//! otherwise). Only transport failures and
//! authenticator failures surface as [`encore_core::EncoreError`].
//!
//! ```rust
//! use encore_extract::{ExtractionError, ExtractionSource};
//!
//! let err = ExtractionError::invalid_type(ExtractionSource::Form, "Price", "expected decimal");
//! assert_eq!(err.field(), Some("Price"));
//! assert_eq!(err.error_code(), "INVALID_FIELD");
//! ```

#![doc(html_root_url = "https://docs.rs/encore-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod album;
mod body;
pub mod cookie;
mod error;
mod form;
mod media;
mod negotiation;
mod parser;
mod session;
mod session_store;

pub use album::{form_keys, AlbumForm};
pub use body::{read_body, read_limited, DEFAULT_MAX_BODY_SIZE};
pub use cookie::{delete_cookie, get_cookie, set_cookie, Cookies, SameSite, SetCookie};
pub use error::{ExtractionError, ExtractionSource};
pub use form::{FormFields, FromFormFields};
pub use media::BodyFormat;
pub use negotiation::Negotiation;
pub use parser::{decode, BodyParser};
pub use session::{Session, DEFAULT_ADMIN_ROLE};
pub use session_store::{CookieSessionAuthenticator, DEFAULT_SESSION_COOKIE};

// Re-export useful types from dependencies
pub use mime::Mime;
pub use rust_decimal::Decimal;
