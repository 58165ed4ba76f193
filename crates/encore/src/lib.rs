//! # Encore
//!
//! The request-processing core of a content-negotiating web store.
//!
//! - **Effects**: [`Task`] describes work against a request environment;
//!   memoized tasks run at most once per request.
//! - **Session**: identity lookup, `is_authenticated`/`is_admin`, sign-in and
//!   sign-out through a pluggable [`Authenticator`].
//! - **Body parsing**: form or JSON bodies into typed values, with malformed
//!   input collapsing to `None`.
//! - **Negotiation**: JSON or HTML renderings of the same value, with a
//!   view bag carrying the signed-in user and cart summary.
//! - **Gates**: authenticated and admin checks per HTTP method, answered with
//!   the `logon` (401) or `forbidden` (403) page.
//!
//! ## Example
//!
//! ```rust
//! use encore::prelude::*;
//! use std::sync::Arc;
//!
//! # struct Store;
//! # impl StoreContext for Store {
//! #     type Handle = ();
//! #     fn open(&self) -> anyhow::Result<()> { Ok(()) }
//! #     fn cart_lines(&self, _: &mut (), _: &str) -> anyhow::Result<Vec<CartLine>> { Ok(vec![]) }
//! # }
//! # struct Views;
//! # impl TemplateEngine for Views {
//! #     fn render(&self, view: &str, _: &serde_json::Value, _: &ViewBag) -> anyhow::Result<String> {
//! #         Ok(view.to_string())
//! #     }
//! # }
//! let app = Encore::new(EncoreConfig::default()).unwrap();
//! let negotiator = app.negotiator(Arc::new(Store), Arc::new(Views));
//!
//! let parser = app.body_parser().clone();
//! let handler_negotiator = negotiator.clone();
//! let albums = app
//!     .resource("albums", &negotiator)
//!     .gate(AuthGate::admin([http::Method::POST]))
//!     .handler(move |env, negotiation| {
//!         let parser = parser.clone();
//!         let negotiator = handler_negotiator.clone();
//!         Box::pin(async move {
//!             let album = parser.read_album().run(env).await?;
//!             negotiator
//!                 .represent(env, &negotiation, "album", |_| Ok(album))
//!                 .await
//!         })
//!     });
//!
//! assert_eq!(albums.stage_names(), vec!["request_log", "admin"]);
//! ```

#![doc(html_root_url = "https://docs.rs/encore/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{Encore, StartupError};

// Re-export core types
pub use encore_core as core;

// Re-export extraction types
pub use encore_extract as extract;

// Re-export rendering types
pub use encore_render as render;

// Re-export middleware types
pub use encore_middleware as middleware;

// Re-export configuration types
pub use encore_config as config;
pub use encore_config::EncoreConfig;

// Re-export telemetry types
pub use encore_telemetry as telemetry;

pub use encore_core::{Authenticator, EncoreError, EncoreResult, RequestEnv, Task};

/// Prelude module for convenient imports.
///
/// ```rust
/// use encore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::Encore;
    pub use encore_config::{ConfigLoader, EncoreConfig};
    pub use encore_core::{
        Authenticator, BoxFuture, ClaimsIdentity, EncoreError, EncoreResult, Identity, RequestEnv,
        RequestId, Task,
    };
    pub use encore_extract::{
        AlbumForm, BodyParser, CookieSessionAuthenticator, FormFields, FromFormFields, Negotiation,
        Session,
    };
    pub use encore_middleware::{AuthGate, GateDecision, Middleware, Next, Resource, Response};
    pub use encore_render::{
        CartLine, FailureViews, Negotiator, Representation, StoreContext, TemplateEngine, ViewBag,
    };
}
