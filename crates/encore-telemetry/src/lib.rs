//! Observability for the Encore request pipeline.
//!
//! - **Logging**: structured JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: Prometheus-format counters and histograms via the `metrics` crate
//!
//! Libraries in the workspace log through `tracing` macros using the field
//! names in [`logging::fields`], and record metrics with the functions in
//! [`metrics`]. Binaries call [`init_logging`] and [`init_metrics`] once at
//! startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use encore_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::production())?;
//! init_metrics(&MetricsConfig::default())?;
//! ```

#![doc(html_root_url = "https://docs.rs/encore-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
