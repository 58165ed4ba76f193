//! Resources: a handler behind a fixed chain of stages.
//!
//! ```text
//! Request → RequestLog → Gate* → Middleware* → Negotiation → Handler
//! ```
//!
//! Gates run in the order they were added. A gate that fails short-circuits
//! to its failure page; the handler never runs. When the client accepts none
//! of the supported media types the resource answers `406` without calling
//! the handler.

use crate::gate::{AuthGate, GateStage};
use crate::logging::RequestLogMiddleware;
use crate::middleware::{Middleware, Next};
use crate::types::{Response, ResponseExt};
use encore_core::{BoxFuture, EncoreResult, RequestEnv};
use encore_extract::{Mime, Negotiation, Session};
use encore_render::{error_response, FailureViews, Representation};
use encore_telemetry::metrics::record_request;
use http::StatusCode;
use std::sync::Arc;

/// A resource handler: renders a representation for a negotiated request.
pub type Handler = Arc<
    dyn for<'a> Fn(&'a RequestEnv, Negotiation) -> BoxFuture<'a, EncoreResult<Representation>>
        + Send
        + Sync,
>;

/// Media types a resource produces unless configured otherwise.
#[must_use]
pub fn default_media_types() -> Vec<Mime> {
    vec![mime::APPLICATION_JSON, mime::TEXT_HTML]
}

/// A gated, negotiated resource.
///
/// # Example
///
/// ```
/// use encore_extract::Session;
/// use encore_middleware::{AuthGate, Resource};
/// use encore_render::{FailureViews, Negotiator, Representation};
/// use encore_test::{InMemoryStore, RecordingTemplateEngine, TestEnv};
/// use http::{Method, StatusCode};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let session = Session::new();
/// let negotiator = Negotiator::new(
///     Arc::new(InMemoryStore::new()),
///     Arc::new(RecordingTemplateEngine::new()),
///     session.clone(),
/// );
/// let views: Arc<dyn FailureViews> = Arc::new(negotiator);
///
/// let resource = Resource::builder("albums", session, views)
///     .gate(AuthGate::authenticated([Method::POST]))
///     .handler(|_env, _negotiation| {
///         Box::pin(async { Ok(Representation::json("[]")) })
///     });
///
/// let response = resource.serve(&TestEnv::get("/albums").build()).await;
/// assert_eq!(response.status(), StatusCode::OK);
///
/// let response = resource.serve(&TestEnv::post("/albums").build()).await;
/// assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
/// # }
/// ```
pub struct Resource {
    name: &'static str,
    stages: Vec<Arc<dyn Middleware>>,
    supported: Vec<Mime>,
    handler: Handler,
}

impl Resource {
    /// Starts building a resource.
    ///
    /// `session` should be shared with the views so that gates and rendering
    /// use one memoized identity lookup.
    #[must_use]
    pub fn builder(
        name: &'static str,
        session: Session,
        views: Arc<dyn FailureViews>,
    ) -> ResourceBuilder {
        ResourceBuilder {
            name,
            session,
            views,
            gates: Vec::new(),
            middleware: Vec::new(),
            supported: default_media_types(),
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the media types this resource produces.
    #[must_use]
    pub fn supported(&self) -> &[Mime] {
        &self.supported
    }

    /// Runs the chain for one request.
    ///
    /// # Errors
    ///
    /// Returns whatever the gates, the views or the handler fail with; the
    /// transport maps it with [`encore_core::EncoreError::status_code`].
    pub async fn respond(&self, env: &RequestEnv) -> EncoreResult<Response> {
        let result = self.build_chain().run(env).await;
        let status = match &result {
            Ok(response) => response.status(),
            Err(err) => err.status_code(),
        };
        record_request(self.name, status.as_u16(), env.elapsed());
        result
    }

    /// Runs the chain and turns any failure into a plain error response.
    pub async fn serve(&self, env: &RequestEnv) -> Response {
        match self.respond(env).await {
            Ok(response) => response,
            Err(err) => error_response(&err, env.request_id()),
        }
    }

    fn build_chain(&self) -> Next<'_> {
        let mut next = Next::handler(move |env| Box::pin(self.negotiate(env)));
        for stage in self.stages.iter().rev() {
            next = Next::new(stage.as_ref(), next);
        }
        next
    }

    async fn negotiate(&self, env: &RequestEnv) -> EncoreResult<Response> {
        let negotiation = Negotiation::from_env(env, &self.supported);
        if !negotiation.is_acceptable() {
            tracing::debug!(
                request_id = %env.request_id(),
                resource = self.name,
                accept = env.header("accept").unwrap_or_default(),
                "no acceptable representation"
            );
            return Ok(Response::error(StatusCode::NOT_ACCEPTABLE, "Not Acceptable")
                .with_parts(&env.take_response_parts()));
        }

        let representation = (self.handler)(env, negotiation).await?;
        representation.into_response(StatusCode::OK, &env.take_response_parts())
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Resource`].
pub struct ResourceBuilder {
    name: &'static str,
    session: Session,
    views: Arc<dyn FailureViews>,
    gates: Vec<AuthGate>,
    middleware: Vec<Arc<dyn Middleware>>,
    supported: Vec<Mime>,
}

impl ResourceBuilder {
    /// Adds a gate. Gates run in the order added.
    #[must_use]
    pub fn gate(mut self, gate: AuthGate) -> Self {
        self.gates.push(gate);
        self
    }

    /// Adds a stage that runs after every gate.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the media types this resource produces.
    #[must_use]
    pub fn supports(mut self, media_types: impl IntoIterator<Item = Mime>) -> Self {
        self.supported = media_types.into_iter().collect();
        self
    }

    /// Sets the handler and finishes the resource.
    pub fn handler<F>(self, handler: F) -> Resource
    where
        F: for<'a> Fn(&'a RequestEnv, Negotiation) -> BoxFuture<'a, EncoreResult<Representation>>
            + Send
            + Sync
            + 'static,
    {
        let mut stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(RequestLogMiddleware)];
        for gate in self.gates {
            stages.push(Arc::new(GateStage::new(gate, &self.session, Arc::clone(&self.views))));
        }
        stages.extend(self.middleware);

        Resource {
            name: self.name,
            stages,
            supported: self.supported,
            handler: Arc::new(handler),
        }
    }
}

impl std::fmt::Debug for ResourceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBuilder")
            .field("name", &self.name)
            .field("gates", &self.gates)
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::EncoreError;
    use encore_render::Negotiator;
    use encore_test::{
        CountingAuthenticator, InMemoryStore, RecordingTemplateEngine, TestEnv, TestResponse,
    };
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        templates: Arc<RecordingTemplateEngine>,
        handled: Arc<AtomicUsize>,
        resource: Resource,
    }

    fn fixture(gates: Vec<AuthGate>) -> Fixture {
        let session = Session::new();
        let templates = Arc::new(RecordingTemplateEngine::new());
        let negotiator = Negotiator::new(
            Arc::new(InMemoryStore::new().with_cart_line("alice", 1, 2)),
            Arc::clone(&templates),
            session.clone(),
        );
        let views: Arc<dyn FailureViews> = Arc::new(negotiator.clone());
        let handled = Arc::new(AtomicUsize::new(0));

        let mut builder = Resource::builder("album", session, views);
        for gate in gates {
            builder = builder.gate(gate);
        }
        let counter = Arc::clone(&handled);
        let resource = builder.handler(move |env, negotiation| {
            counter.fetch_add(1, Ordering::SeqCst);
            let negotiator = negotiator.clone();
            Box::pin(async move {
                negotiator
                    .represent(env, &negotiation, "album", |_| {
                        Ok(serde_json::json!({"title": "Foo"}))
                    })
                    .await
            })
        });

        Fixture {
            templates,
            handled,
            resource,
        }
    }

    fn user(name: &str, role: &str) -> Arc<CountingAuthenticator> {
        Arc::new(CountingAuthenticator::signed_in(name, role))
    }

    #[tokio::test]
    async fn test_stage_order() {
        let fixture = fixture(vec![AuthGate::authenticated([]), AuthGate::admin([Method::POST])]);
        assert_eq!(
            fixture.resource.stage_names(),
            vec!["request_log", "authenticated", "admin"]
        );
    }

    #[tokio::test]
    async fn test_get_outside_gated_set_passes_anonymously() {
        let fixture = fixture(vec![AuthGate::authenticated([Method::POST])]);
        let env = TestEnv::get("/albums/1").accept("application/json").build();

        let response = TestResponse::from_http(fixture.resource.respond(&env).await.unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), r#"{"title":"Foo"}"#);
        assert_eq!(fixture.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_renders_logon_with_return_url() {
        let fixture = fixture(vec![AuthGate::authenticated([Method::POST])]);
        let env = TestEnv::post("/albums/1?edit=true").build();

        let response = fixture.resource.respond(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(fixture.handled.load(Ordering::SeqCst), 0);

        let call = fixture.templates.last().unwrap();
        assert_eq!(call.view, "logon");
        assert_eq!(call.model["ReturnUrl"], "/albums/1?edit=true");
        assert_eq!(call.model["ValidationMsg"], "");
    }

    #[tokio::test]
    async fn test_non_admin_mutation_is_forbidden() {
        let fixture = fixture(vec![
            AuthGate::authenticated([]),
            AuthGate::admin([Method::POST, Method::PUT, Method::DELETE]),
        ]);
        let auth = user("alice", "user");
        let env = TestEnv::put("/albums/1")
            .accept("application/json")
            .authenticator(auth.clone())
            .build();

        let response = TestResponse::from_http(fixture.resource.respond(&env).await.unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(fixture.templates.last().unwrap().view, "forbidden");
        assert_eq!(fixture.handled.load(Ordering::SeqCst), 0);
        assert_eq!(auth.authenticate_calls(), 1);
    }

    #[tokio::test]
    async fn test_admin_mutation_reaches_handler() {
        let fixture = fixture(vec![
            AuthGate::authenticated([]),
            AuthGate::admin([Method::POST]),
        ]);
        let auth = user("root", "admin");
        let env = TestEnv::post("/albums")
            .accept("text/html")
            .authenticator(auth.clone())
            .build();

        let response = fixture.resource.respond(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fixture.templates.last().unwrap().view, "album");
        assert_eq!(auth.authenticate_calls(), 1);
    }

    #[tokio::test]
    async fn test_not_acceptable_skips_handler() {
        let fixture = fixture(vec![]);
        let env = TestEnv::get("/albums/1").accept("image/png").build();

        let response = fixture.resource.respond(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(fixture.handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_serve_maps_errors() {
        let session = Session::new();
        let views: Arc<dyn FailureViews> = Arc::new(Negotiator::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingTemplateEngine::new()),
            session.clone(),
        ));
        let resource = Resource::builder("broken", session, views).handler(|_env, _negotiation| {
            Box::pin(async { Err(EncoreError::unsupported_representation("text/csv")) })
        });

        let env = TestEnv::get("/broken").build();
        let response = resource.serve(&env).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_custom_media_types() {
        let session = Session::new();
        let views: Arc<dyn FailureViews> = Arc::new(Negotiator::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingTemplateEngine::new()),
            session.clone(),
        ));
        let resource = Resource::builder("feed", session, views)
            .supports([mime::APPLICATION_JSON])
            .handler(|_env, negotiation| {
                Box::pin(async move {
                    assert_eq!(negotiation.preferred(), Some(&mime::APPLICATION_JSON));
                    Ok(Representation::json("[]"))
                })
            });

        let env = TestEnv::get("/feed").accept("text/html").build();
        let response = resource.respond(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

        let env = TestEnv::get("/feed").accept("*/*").build();
        let response = resource.respond(&env).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(resource.supported(), &[mime::APPLICATION_JSON]);
    }
}
