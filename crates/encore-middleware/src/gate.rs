//! Authorization gates.
//!
//! A gate guards a resource for a set of HTTP methods:
//!
//! ```text
//! Start ─► method gated? ── no ──► Continue
//!               │
//!              yes ─► predicate? ── true ──► Continue
//!                          │
//!                        false ─► Unauthorized (authenticated gate)
//!                                 Forbidden    (admin gate)
//! ```
//!
//! An empty method set gates every method. Gates compose: a resource may
//! carry an authenticated gate for all methods and an admin gate for the
//! mutating ones.

use crate::middleware::{Middleware, Next};
use crate::types::Response;
use encore_core::{BoxFuture, EncoreResult, RequestEnv, Task};
use encore_extract::Session;
use encore_render::FailureViews;
use encore_telemetry::metrics::record_gate_decision;
use http::{Method, StatusCode};
use std::sync::Arc;

/// Which predicate a gate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// The caller must be signed in.
    Authenticated,
    /// The caller must hold the admin role.
    Admin,
}

impl GateKind {
    /// Returns the label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Admin => "admin",
        }
    }

    const fn failure(self) -> GateDecision {
        match self {
            Self::Authenticated => GateDecision::Unauthorized,
            Self::Admin => GateDecision::Forbidden,
        }
    }
}

/// Outcome of evaluating a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateDecision {
    /// Hand the request to the rest of the chain.
    Continue,
    /// Render the sign-in page.
    Unauthorized,
    /// Render the access-denied page.
    Forbidden,
}

impl GateDecision {
    /// Returns the label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        }
    }
}

/// An authorization gate for a set of methods.
///
/// # Example
///
/// ```
/// use encore_middleware::{AuthGate, GateKind};
/// use http::Method;
///
/// let gate = AuthGate::admin([Method::POST, Method::PUT, Method::DELETE]);
/// assert_eq!(gate.kind(), GateKind::Admin);
/// assert!(gate.applies_to(&Method::POST));
/// assert!(!gate.applies_to(&Method::GET));
///
/// assert!(AuthGate::authenticated([]).applies_to(&Method::GET));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate {
    kind: GateKind,
    methods: Vec<Method>,
}

impl AuthGate {
    /// Requires a signed-in caller for `methods` (all methods if empty).
    pub fn authenticated(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::new(GateKind::Authenticated, methods)
    }

    /// Requires an admin caller for `methods` (all methods if empty).
    pub fn admin(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::new(GateKind::Admin, methods)
    }

    fn new(kind: GateKind, methods: impl IntoIterator<Item = Method>) -> Self {
        let mut gated = Vec::new();
        for method in methods {
            if !gated.contains(&method) {
                gated.push(method);
            }
        }
        Self {
            kind,
            methods: gated,
        }
    }

    /// Returns the predicate kind.
    #[must_use]
    pub const fn kind(&self) -> GateKind {
        self.kind
    }

    /// Returns the gated methods. Empty means all.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Whether requests with `method` are subject to this gate.
    #[must_use]
    pub fn applies_to(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    /// The gate's predicate for the current request.
    ///
    /// Always `true` for methods outside the gated set, in which case the
    /// session is not consulted.
    pub fn predicate(&self, session: &Session) -> Task<bool> {
        let check = match self.kind {
            GateKind::Authenticated => session.is_authenticated(),
            GateKind::Admin => session.is_admin(),
        };
        let gate = self.clone();
        Task::from_fn(move |env| Ok(gate.applies_to(env.method()))).bind(move |gated| {
            if gated {
                check.clone()
            } else {
                Task::pure(true)
            }
        })
    }

    /// The gate's decision for the current request.
    pub fn decide(&self, session: &Session) -> Task<GateDecision> {
        let failure = self.kind.failure();
        self.predicate(session).map(move |allowed| {
            if allowed {
                GateDecision::Continue
            } else {
                failure
            }
        })
    }
}

/// A gate bound to the session and failure views of one resource.
pub(crate) struct GateStage {
    gate: AuthGate,
    decision: Task<GateDecision>,
    views: Arc<dyn FailureViews>,
}

impl GateStage {
    pub(crate) fn new(gate: AuthGate, session: &Session, views: Arc<dyn FailureViews>) -> Self {
        let decision = gate.decide(session);
        Self {
            gate,
            decision,
            views,
        }
    }
}

impl Middleware for GateStage {
    fn name(&self) -> &'static str {
        self.gate.kind().as_str()
    }

    fn process<'a>(
        &'a self,
        env: &'a RequestEnv,
        next: Next<'a>,
    ) -> BoxFuture<'a, EncoreResult<Response>> {
        Box::pin(async move {
            let decision = self.decision.run(env).await?;
            let gate = self.gate.kind().as_str();
            record_gate_decision(gate, decision.as_str());

            let (representation, status) = match decision {
                GateDecision::Continue => return next.run(env).await,
                GateDecision::Unauthorized => (
                    self.views.unauthorized(env, env.path_and_query()).await?,
                    StatusCode::UNAUTHORIZED,
                ),
                GateDecision::Forbidden => {
                    (self.views.forbidden(env).await?, StatusCode::FORBIDDEN)
                }
            };

            tracing::debug!(
                request_id = %env.request_id(),
                http.method = %env.method(),
                http.path = env.path(),
                gate,
                decision = decision.as_str(),
                "gate rejected request"
            );
            representation.into_response(status, &env.take_response_parts())
        })
    }
}
