//! Prometheus metrics for Encore.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `encore_requests_total` | Counter | `resource`, `status` | Completed requests |
//! | `encore_request_duration_seconds` | Histogram | `resource` | Request latency |
//! | `encore_gate_decisions_total` | Counter | `gate`, `decision` | Authorization gate outcomes |
//!
//! Recording functions are no-ops until a recorder is installed, so
//! libraries can call them unconditionally.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "encore_requests_total";

/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "encore_request_duration_seconds";

/// Gate decision counter name.
pub const GATE_DECISIONS_TOTAL: &str = "encore_gate_decisions_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Installs the global Prometheus recorder.
///
/// Calling this again after a successful install is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if another recorder is already
/// installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests handled by a resource");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Request duration in seconds");
    describe_counter!(GATE_DECISIONS_TOTAL, "Authorization gate decisions by outcome");
}

/// Records a completed request.
pub fn record_request(resource: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "resource" => resource.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "resource" => resource.to_string())
        .record(duration.as_secs_f64());
}

/// Records a gate decision.
///
/// `gate` is `authenticated` or `admin`; `decision` is `continue`,
/// `unauthorized` or `forbidden`.
pub fn record_gate_decision(gate: &'static str, decision: &'static str) {
    counter!(GATE_DECISIONS_TOTAL, "gate" => gate, "decision" => decision).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("albums", 200, Duration::from_millis(5));
        record_gate_decision("admin", "forbidden");
    }

    #[test]
    fn test_disabled_metrics_installs_nothing() {
        assert!(init_metrics(&MetricsConfig { enabled: false }).is_ok());
    }
}
