//! # Encore Test
//!
//! Test doubles for every external collaborator of the Encore pipeline, plus
//! request and response helpers. Nothing here touches the network.
//!
//! | Double | Replaces | Records |
//! |--------|----------|---------|
//! | [`CountingAuthenticator`] | [`encore_core::Authenticator`] | authenticate/sign-in/sign-out calls |
//! | [`InMemoryStore`] | [`encore_render::StoreContext`] | handles opened |
//! | [`RecordingTemplateEngine`] | [`encore_render::TemplateEngine`] | every render call |
//!
//! ## Example
//!
//! ```
//! use encore_test::{CountingAuthenticator, TestEnv};
//! use std::sync::Arc;
//!
//! let auth = Arc::new(CountingAuthenticator::signed_in("alice", "admin"));
//! let env = TestEnv::post("/albums")
//!     .accept("application/json")
//!     .form("Title=Foo&ArtistId=1&GenreId=2&Price=9.99&ArtUrl=http://x")
//!     .authenticator(auth.clone())
//!     .build();
//!
//! assert_eq!(env.method(), http::Method::POST);
//! assert_eq!(auth.authenticate_calls(), 0);
//! ```

#![doc(html_root_url = "https://docs.rs/encore-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod error;
mod request;
mod response;
mod store;
mod templates;

pub use auth::CountingAuthenticator;
pub use error::TestError;
pub use request::TestEnv;
pub use response::TestResponse;
pub use store::{InMemoryStore, StoreHandle};
pub use templates::{RecordingTemplateEngine, RenderCall};
