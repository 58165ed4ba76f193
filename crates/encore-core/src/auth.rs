//! The authentication collaborator.
//!
//! Encore never decodes credentials itself. Whatever sits behind a scheme name
//! (cookie sessions, bearer tokens, a test double) implements
//! [`Authenticator`] and is handed to each [`RequestEnv`] explicitly.

use crate::context::RequestEnv;
use crate::effect::BoxFuture;
use crate::identity::ClaimsIdentity;

/// Authentication backend consulted by the session layer.
///
/// All operations are asynchronous and fallible. An `Ok(None)` from
/// [`authenticate`](Self::authenticate) means "no caller", which is not an
/// error; an `Err` means the backend itself failed.
///
/// Implementations write cookies and headers through the response side of the
/// environment (see [`RequestEnv::append_set_cookie`]).
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticates the current request under `scheme`.
    fn authenticate<'a>(
        &'a self,
        scheme: &'a str,
        env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<Option<ClaimsIdentity>>>;

    /// Establishes a session carrying `claims`.
    fn sign_in<'a>(
        &'a self,
        scheme: &'a str,
        claims: ClaimsIdentity,
        env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Invalidates the current session, if any.
    fn sign_out<'a>(&'a self, scheme: &'a str, env: &'a RequestEnv)
        -> BoxFuture<'a, anyhow::Result<()>>;
}

/// An authenticator that never recognises anyone and ignores sign-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousAuthenticator;

impl Authenticator for AnonymousAuthenticator {
    fn authenticate<'a>(
        &'a self,
        _scheme: &'a str,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<Option<ClaimsIdentity>>> {
        Box::pin(async { Ok(None) })
    }

    fn sign_in<'a>(
        &'a self,
        _scheme: &'a str,
        _claims: ClaimsIdentity,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn sign_out<'a>(
        &'a self,
        _scheme: &'a str,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
