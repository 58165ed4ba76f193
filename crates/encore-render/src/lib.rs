//! # Encore Render
//!
//! Turning domain values into wire representations.
//!
//! A handler fetches its value through [`Negotiator::represent`], which opens
//! a fresh [`StoreContext`] handle, runs the fetch, and renders the result in
//! the negotiated media type:
//!
//! - JSON: compact `serde_json` serialization of the value
//! - HTML: a [`TemplateEngine`] view with the value as model, plus a
//!   [`ViewBag`] carrying the signed-in user and cart summary
//!
//! Any other negotiated type is a server configuration error and surfaces as
//! [`encore_core::EncoreError::UnsupportedRepresentation`].

#![doc(html_root_url = "https://docs.rs/encore-render/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod negotiator;
mod representation;
mod store;
mod template;

pub use negotiator::{FailureViews, Negotiator, DEFAULT_CART_COOKIE, FORBIDDEN_VIEW, LOGON_VIEW};
pub use representation::{error_response, Representation, Response, UTF_8};
pub use store::{cart_count, CartLine, StoreContext};
pub use template::{keys, TemplateEngine, ViewBag};
