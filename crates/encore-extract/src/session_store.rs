//! In-process cookie sessions.

use crate::cookie::{Cookies, SameSite, SetCookie};
use dashmap::DashMap;
use encore_core::{Authenticator, BoxFuture, ClaimsIdentity, RequestEnv, DEFAULT_SCHEME};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default name of the session cookie.
pub const DEFAULT_SESSION_COOKIE: &str = ".encore.session";

/// An [`Authenticator`] keeping claims in a process-local table.
///
/// The browser only holds a random session id, in an `HttpOnly`,
/// `SameSite=Lax` cookie. Sessions do not survive a restart.
///
/// With [`max_age_secs`](Self::max_age_secs) set, a session also expires on
/// the server: a replayed id past its lifetime is anonymous, and expired
/// entries are dropped when they are looked up or when anyone signs in.
///
/// # Example
///
/// ```rust
/// use encore_extract::CookieSessionAuthenticator;
///
/// let sessions = CookieSessionAuthenticator::new()
///     .cookie_name("sid")
///     .max_age_secs(3600)
///     .secure(true);
/// assert_eq!(sessions.session_count(), 0);
/// ```
#[derive(Debug)]
pub struct CookieSessionAuthenticator {
    scheme: String,
    cookie_name: String,
    max_age_secs: Option<u64>,
    secure: bool,
    sessions: DashMap<String, StoredSession>,
}

#[derive(Debug, Clone)]
struct StoredSession {
    claims: ClaimsIdentity,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl CookieSessionAuthenticator {
    /// Creates an authenticator for the default scheme and cookie name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            max_age_secs: None,
            secure: false,
            sessions: DashMap::new(),
        }
    }

    /// Sets the scheme name this authenticator answers to.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Sets the session cookie name.
    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Makes the session cookie persistent for `seconds`, and expires the
    /// session on the server after the same time.
    #[must_use]
    pub fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age_secs = Some(seconds);
        self
    }

    /// Marks the session cookie `Secure`.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns the number of stored sessions, including expired ones not yet swept.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_id(&self, env: &RequestEnv) -> Option<String> {
        Cookies::from_headers(env.headers())
            .get(&self.cookie_name)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn check_scheme(&self, scheme: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            scheme == self.scheme,
            "unknown authentication scheme '{scheme}', expected '{}'",
            self.scheme
        );
        Ok(())
    }

    fn session_cookie(&self, id: &str) -> SetCookie {
        let cookie = SetCookie::new(&self.cookie_name, id)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        match self.max_age_secs {
            Some(seconds) => cookie.max_age_secs(seconds),
            None => cookie,
        }
    }
}

impl Default for CookieSessionAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for CookieSessionAuthenticator {
    fn authenticate<'a>(
        &'a self,
        scheme: &'a str,
        env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<Option<ClaimsIdentity>>> {
        Box::pin(async move {
            self.check_scheme(scheme)?;
            let Some(id) = self.session_id(env) else {
                return Ok(None);
            };
            let now = Instant::now();
            let stored = self.sessions.get(&id).map(|entry| entry.value().clone());
            match stored {
                Some(session) if session.is_expired(now) => {
                    self.sessions.remove_if(&id, |_, s| s.is_expired(now));
                    tracing::debug!(request_id = %env.request_id(), "session expired");
                    Ok(None)
                }
                Some(session) => Ok(Some(session.claims)),
                None => Ok(None),
            }
        })
    }

    fn sign_in<'a>(
        &'a self,
        scheme: &'a str,
        claims: ClaimsIdentity,
        env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.check_scheme(scheme)?;
            if let Some(previous) = self.session_id(env) {
                self.sessions.remove(&previous);
            }
            let now = Instant::now();
            self.sessions.retain(|_, s| !s.is_expired(now));

            let id = Uuid::new_v4().simple().to_string();
            let expires_at = self
                .max_age_secs
                .map(|seconds| now + Duration::from_secs(seconds));
            self.sessions.insert(id.clone(), StoredSession { claims, expires_at });
            self.session_cookie(&id).write_to(env)?;
            tracing::debug!(request_id = %env.request_id(), "session established");
            Ok(())
        })
    }

    fn sign_out<'a>(
        &'a self,
        scheme: &'a str,
        env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.check_scheme(scheme)?;
            if let Some(id) = self.session_id(env) {
                self.sessions.remove(&id);
            }
            SetCookie::remove(&self.cookie_name).path("/").write_to(env)?;
            tracing::debug!(request_id = %env.request_id(), "session cleared");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use encore_core::Identity;
    use std::sync::Arc;

    fn env(auth: &Arc<CookieSessionAuthenticator>, cookie: Option<&str>) -> RequestEnv {
        let mut builder = RequestEnv::builder().authenticator(Arc::clone(auth) as Arc<dyn Authenticator>);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.build()
    }

    fn session_cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_sign_in_then_authenticate_on_next_request() {
        let auth = Arc::new(CookieSessionAuthenticator::new());
        let session = Session::new();

        let first = env(&auth, None);
        session
            .sign_in(Identity::new("alice", "admin"))
            .run(&first)
            .await
            .unwrap();

        let written = first.set_cookies();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with(".encore.session="));
        assert!(written[0].contains("HttpOnly"));
        assert!(written[0].contains("SameSite=Lax"));
        assert_eq!(auth.session_count(), 1);

        let second = env(&auth, Some(&session_cookie_pair(&written[0])));
        assert_eq!(
            session.get_auth().run(&second).await.unwrap(),
            Some(Identity::new("alice", "admin"))
        );
    }

    #[tokio::test]
    async fn test_sign_out_removes_session_and_cookie() {
        let auth = Arc::new(CookieSessionAuthenticator::new().cookie_name("sid"));
        let session = Session::new();

        let first = env(&auth, None);
        session.sign_in(Identity::new("bob", "user")).run(&first).await.unwrap();
        let cookie = session_cookie_pair(&first.set_cookies()[0]);

        let second = env(&auth, Some(&cookie));
        session.sign_out().run(&second).await.unwrap();
        assert_eq!(auth.session_count(), 0);
        assert_eq!(second.set_cookies(), vec!["sid=; Path=/; Max-Age=0".to_string()]);

        let third = env(&auth, Some(&cookie));
        assert_eq!(session.get_auth().run(&third).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_replaces_previous_session() {
        let auth = Arc::new(CookieSessionAuthenticator::new().cookie_name("sid"));
        let session = Session::new();

        let first = env(&auth, None);
        session.sign_in(Identity::new("bob", "user")).run(&first).await.unwrap();
        let cookie = session_cookie_pair(&first.set_cookies()[0]);

        let second = env(&auth, Some(&cookie));
        session.sign_in(Identity::new("bob", "admin")).run(&second).await.unwrap();
        assert_eq!(auth.session_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_id_is_anonymous() {
        let auth = Arc::new(CookieSessionAuthenticator::new());
        let request = env(&auth, Some(".encore.session=forged"));
        assert_eq!(Session::new().get_auth().run(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_scheme_fails() {
        let auth = Arc::new(CookieSessionAuthenticator::new().scheme("Bearer"));
        let request = env(&auth, None);
        let err = Session::new().get_auth().run(&request).await.unwrap_err();
        assert!(err.to_string().contains("unknown authentication scheme"));
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous_and_removed() {
        let auth = Arc::new(CookieSessionAuthenticator::new().max_age_secs(1));
        let session = Session::new();

        let first = env(&auth, None);
        session.sign_in(Identity::new("alice", "admin")).run(&first).await.unwrap();
        let cookie = session_cookie_pair(&first.set_cookies()[0]);

        let fresh = env(&auth, Some(&cookie));
        assert!(session.get_auth().run(&fresh).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let replayed = env(&auth, Some(&cookie));
        assert_eq!(session.get_auth().run(&replayed).await.unwrap(), None);
        assert_eq!(auth.session_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_sweeps_expired_sessions() {
        let auth = Arc::new(CookieSessionAuthenticator::new().max_age_secs(1));
        let session = Session::new();

        for name in ["alice", "bob"] {
            let request = env(&auth, None);
            session.sign_in(Identity::new(name, "user")).run(&request).await.unwrap();
        }
        assert_eq!(auth.session_count(), 2);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let request = env(&auth, None);
        session.sign_in(Identity::new("carol", "user")).run(&request).await.unwrap();
        assert_eq!(auth.session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_without_max_age_does_not_expire() {
        let auth = Arc::new(CookieSessionAuthenticator::new());
        let first = env(&auth, None);
        Session::new()
            .sign_in(Identity::new("alice", "admin"))
            .run(&first)
            .await
            .unwrap();
        let cookie = session_cookie_pair(&first.set_cookies()[0]);

        let stored = auth.sessions.iter().next().unwrap().value().clone();
        assert!(stored.expires_at.is_none());
        assert!(!stored.is_expired(Instant::now() + Duration::from_secs(86_400)));

        let later = env(&auth, Some(&cookie));
        assert!(Session::new().get_auth().run(&later).await.unwrap().is_some());
    }

    #[test]
    fn test_persistent_cookie_attributes() {
        let auth = CookieSessionAuthenticator::new().max_age_secs(60).secure(true);
        let value = auth.session_cookie("abc").to_header_value();
        assert_eq!(
            value,
            ".encore.session=abc; Path=/; Max-Age=60; Secure; HttpOnly; SameSite=Lax"
        );
    }
}
