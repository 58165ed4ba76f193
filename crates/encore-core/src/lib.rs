//! # Encore Core
//!
//! Core types for the Encore request pipeline.
//!
//! - [`Task`] - Lazy, composable, memoizable computation over a request
//! - [`RequestEnv`] - Per-request environment (request side, response side, memo cache)
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Identity`] / [`ClaimsIdentity`] - Caller identity and the claims it comes from
//! - [`Authenticator`] - Authentication collaborator trait
//! - [`EncoreError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/encore-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod context;
mod effect;
mod error;
mod identity;

pub use auth::{AnonymousAuthenticator, Authenticator};
pub use context::{
    BoxError, RequestBody, RequestEnv, RequestEnvBuilder, RequestId, ResponseParts, DEFAULT_SCHEME,
};
pub use effect::{BoxFuture, Task};
pub use error::{EncoreError, EncoreResult, ErrorCategory};
pub use identity::{claim_types, Claim, ClaimsIdentity, Identity};
