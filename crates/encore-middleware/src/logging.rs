//! Request logging stage.

use crate::middleware::{Middleware, Next};
use crate::types::Response;
use encore_core::{BoxFuture, EncoreResult, RequestEnv};

/// Logs the start and outcome of every request.
///
/// Completion is logged at `info` with status and duration. A failure is
/// logged at `error` with the error code; it is still returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn process<'a>(
        &'a self,
        env: &'a RequestEnv,
        next: Next<'a>,
    ) -> BoxFuture<'a, EncoreResult<Response>> {
        Box::pin(async move {
            tracing::debug!(
                request_id = %env.request_id(),
                http.method = %env.method(),
                http.path = env.path(),
                "request started"
            );

            let result = next.run(env).await;
            let duration_ms = env.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(response) => tracing::info!(
                    request_id = %env.request_id(),
                    http.method = %env.method(),
                    http.path = env.path(),
                    http.status_code = response.status().as_u16(),
                    duration_ms,
                    "request completed"
                ),
                Err(err) => tracing::error!(
                    request_id = %env.request_id(),
                    http.method = %env.method(),
                    http.path = env.path(),
                    http.status_code = err.status_code().as_u16(),
                    error = %err,
                    error_code = err.error_code(),
                    duration_ms,
                    "request failed"
                ),
            }
            result
        })
    }
}
