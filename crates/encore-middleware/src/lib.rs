//! # Encore Middleware
//!
//! The request chain that sits in front of every Encore resource.
//!
//! ```text
//! Request → RequestLog → AuthGate* → Middleware* → Negotiation → Handler
//!                            │
//!                            └─► logon (401) / forbidden (403)
//! ```
//!
//! | Stage | Type | Purpose |
//! |-------|------|---------|
//! | 1 | [`RequestLogMiddleware`] | Start/completion logs with request id, status and duration |
//! | 2 | [`AuthGate`] | Authenticated or admin check for a set of methods |
//! | 3 | custom [`Middleware`] | Anything added with [`ResourceBuilder::middleware`] |
//! | 4 | negotiation | `Accept` against the supported media types; `406` if none match |
//! | 5 | handler | Produces the [`encore_render::Representation`] |
//!
//! Gate failures never surface as raw errors: they render the `logon` or
//! `forbidden` page through [`encore_render::FailureViews`]. Everything else
//! that fails comes back as an [`encore_core::EncoreError`].

#![doc(html_root_url = "https://docs.rs/encore-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod gate;
pub mod logging;
pub mod middleware;
pub mod resource;
pub mod types;

pub use gate::{AuthGate, GateDecision, GateKind};
pub use logging::RequestLogMiddleware;
pub use middleware::{Middleware, Next};
pub use resource::{default_media_types, Handler, Resource, ResourceBuilder};
pub use types::{Response, ResponseExt};
