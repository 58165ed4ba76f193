//! Core middleware trait and the `Next` chain.
//!
//! A [`Middleware`] sees the request environment and a [`Next`] handle to the
//! rest of the chain. It either calls `next.run(env)` exactly once, or
//! short-circuits with its own response. Failures are [`EncoreError`]s and
//! travel back out unchanged.
//!
//! # Example
//!
//! ```
//! use encore_core::{BoxFuture, EncoreResult, RequestEnv};
//! use encore_middleware::{Middleware, Next, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         env: &'a RequestEnv,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, EncoreResult<Response>> {
//!         Box::pin(async move {
//!             let response = next.run(env).await;
//!             tracing::debug!(elapsed = ?env.elapsed(), "handled");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::types::Response;
use encore_core::{BoxFuture, EncoreResult, RequestEnv};

/// A stage in a resource's middleware chain.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - A stage does not swallow errors from downstream stages
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, delegating to `next` to continue the chain.
    fn process<'a>(
        &'a self,
        env: &'a RequestEnv,
        next: Next<'a>,
    ) -> BoxFuture<'a, EncoreResult<Response>>;
}

type Terminal<'a> = Box<dyn FnOnce(&'a RequestEnv) -> BoxFuture<'a, EncoreResult<Response>> + Send + 'a>;

/// The remainder of a middleware chain.
///
/// Consumed by [`Next::run`], so it can be invoked only once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Terminal<'a>),
}

impl<'a> Next<'a> {
    /// Wraps `next` with `middleware`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// The end of the chain.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&'a RequestEnv) -> BoxFuture<'a, EncoreResult<Response>> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Runs the next stage, or the handler at the end of the chain.
    pub async fn run(self, env: &'a RequestEnv) -> EncoreResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(env, *next).await,
            NextInner::Handler(handler) => handler(env).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::Handler(_) => f.write_str("Next(handler)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use encore_core::EncoreError;
    use http::StatusCode;
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        visits: &'static Mutex<Vec<&'static str>>,
    }

    impl Middleware for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            env: &'a RequestEnv,
            next: Next<'a>,
        ) -> BoxFuture<'a, EncoreResult<Response>> {
            Box::pin(async move {
                self.visits.lock().unwrap().push(self.name);
                next.run(env).await
            })
        }
    }

    struct Reject;

    impl Middleware for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn process<'a>(
            &'a self,
            _env: &'a RequestEnv,
            _next: Next<'a>,
        ) -> BoxFuture<'a, EncoreResult<Response>> {
            Box::pin(async { Ok(Response::error(StatusCode::FORBIDDEN, "no")) })
        }
    }

    fn ok_handler<'a>() -> Next<'a> {
        Next::handler(|_env| Box::pin(async { Ok(Response::error(StatusCode::OK, "OK")) }))
    }

    #[tokio::test]
    async fn test_next_handler() {
        let env = RequestEnv::builder().build();
        let response = ok_handler().run(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        static VISITS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let first = Recording {
            name: "first",
            visits: &VISITS,
        };
        let second = Recording {
            name: "second",
            visits: &VISITS,
        };

        let env = RequestEnv::builder().build();
        let next = Next::new(&first, Next::new(&second, ok_handler()));
        let response = next.run(&env).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*VISITS.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let env = RequestEnv::builder().build();
        let next = Next::new(
            &Reject,
            Next::handler(|_env| Box::pin(async { Err(EncoreError::internal("handler ran")) })),
        );
        let response = next.run(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let env = RequestEnv::builder().build();
        let next = Next::handler(|_env| Box::pin(async { Err(EncoreError::internal("boom")) }));
        assert_eq!(next.run(&env).await.unwrap_err(), EncoreError::internal("boom"));
    }
}
