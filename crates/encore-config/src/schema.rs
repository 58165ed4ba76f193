//! Configuration section types.

use serde::{Deserialize, Serialize};

/// Session and cookie settings.
///
/// # Example
///
/// ```
/// use encore_config::SessionConfig;
///
/// let session = SessionConfig::default();
/// assert_eq!(session.scheme, "Cookies");
/// assert_eq!(session.cart_cookie, "cartId");
/// assert_eq!(session.admin_role, "admin");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Authentication scheme name passed to the authenticator.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Name of the anonymous cart cookie.
    #[serde(default = "default_cart_cookie")]
    pub cart_cookie: String,

    /// Role that grants admin rights.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,

    /// Session cookie lifetime. `None` makes it a browser-session cookie.
    #[serde(default)]
    pub max_age_secs: Option<u64>,

    /// Whether the session cookie carries the `Secure` attribute.
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            cookie_name: default_cookie_name(),
            cart_cookie: default_cart_cookie(),
            admin_role: default_admin_role(),
            max_age_secs: None,
            secure: false,
        }
    }
}

fn default_scheme() -> String {
    "Cookies".to_string()
}

fn default_cookie_name() -> String {
    ".encore.session".to_string()
}

fn default_cart_cookie() -> String {
    "cartId".to_string()
}

fn default_admin_role() -> String {
    "admin".to_string()
}

/// Request body settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Largest body the parser will read, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> usize {
    1024 * 1024
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> encore_telemetry::LogConfig {
        encore_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi_enabled: self.ansi_enabled,
            file_line_info: self.include_location,
            ..encore_telemetry::LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// Converts to the telemetry crate's metrics configuration.
    #[must_use]
    pub fn to_metrics_config(&self) -> encore_telemetry::MetricsConfig {
        encore_telemetry::MetricsConfig {
            enabled: self.enabled,
        }
    }
}

fn default_true() -> bool {
    true
}
