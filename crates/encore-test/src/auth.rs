//! An authenticator double with call counters.

use encore_core::{claim_types, Authenticator, BoxFuture, ClaimsIdentity, RequestEnv};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a fixed set of claims and counts every call.
///
/// `sign_in` replaces the claims returned by later `authenticate` calls and
/// `sign_out` clears them, so one instance can stand in for a session across
/// several requests.
#[derive(Debug, Default)]
pub struct CountingAuthenticator {
    claims: Mutex<Option<ClaimsIdentity>>,
    failure: Option<String>,
    schemes: Mutex<Vec<String>>,
    authenticate_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl CountingAuthenticator {
    /// Nobody is signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller with the given name and role claims.
    #[must_use]
    pub fn signed_in(name: &str, role: &str) -> Self {
        Self::with_claims(
            ClaimsIdentity::new()
                .with_claim(claim_types::NAME, name)
                .with_claim(claim_types::ROLE, role),
        )
    }

    /// A caller with arbitrary claims.
    #[must_use]
    pub fn with_claims(claims: ClaimsIdentity) -> Self {
        Self {
            claims: Mutex::new(Some(claims)),
            ..Self::default()
        }
    }

    /// Every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of `authenticate` calls so far.
    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    /// Number of `sign_in` calls so far.
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of `sign_out` calls so far.
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// The claims currently held.
    pub fn current_claims(&self) -> Option<ClaimsIdentity> {
        self.claims.lock().clone()
    }

    /// Scheme names passed to any call, in order.
    pub fn schemes(&self) -> Vec<String> {
        self.schemes.lock().clone()
    }

    fn check(&self, scheme: &str) -> anyhow::Result<()> {
        self.schemes.lock().push(scheme.to_string());
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

impl Authenticator for CountingAuthenticator {
    fn authenticate<'a>(
        &'a self,
        scheme: &'a str,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<Option<ClaimsIdentity>>> {
        Box::pin(async move {
            self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            self.check(scheme)?;
            Ok(self.claims.lock().clone())
        })
    }

    fn sign_in<'a>(
        &'a self,
        scheme: &'a str,
        claims: ClaimsIdentity,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            self.check(scheme)?;
            *self.claims.lock() = Some(claims);
            Ok(())
        })
    }

    fn sign_out<'a>(
        &'a self,
        scheme: &'a str,
        _env: &'a RequestEnv,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            self.check(scheme)?;
            *self.claims.lock() = None;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_then_out() {
        let auth = CountingAuthenticator::anonymous();
        let env = RequestEnv::builder().build();

        assert!(auth.authenticate("Cookies", &env).await.unwrap().is_none());

        let claims = ClaimsIdentity::new().with_claim(claim_types::NAME, "bob");
        auth.sign_in("Cookies", claims.clone(), &env).await.unwrap();
        assert_eq!(auth.authenticate("Cookies", &env).await.unwrap(), Some(claims));

        auth.sign_out("Cookies", &env).await.unwrap();
        assert!(auth.current_claims().is_none());

        assert_eq!(auth.authenticate_calls(), 2);
        assert_eq!(auth.sign_in_calls(), 1);
        assert_eq!(auth.sign_out_calls(), 1);
        assert_eq!(auth.schemes().len(), 4);
    }

    #[tokio::test]
    async fn test_failing_counts_calls() {
        let auth = CountingAuthenticator::failing("ticket store offline");
        let env = RequestEnv::builder().build();

        let err = auth.authenticate("Cookies", &env).await.unwrap_err();
        assert_eq!(err.to_string(), "ticket store offline");
        assert_eq!(auth.authenticate_calls(), 1);
    }
}
