//! Root configuration type.

use crate::error::ConfigError;
use crate::schema::{BodyConfig, LogFormat, LoggingConfig, MetricsConfig, SessionConfig};
use serde::{Deserialize, Serialize};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Complete Encore configuration.
///
/// Every section falls back to its defaults, so an empty file is valid.
///
/// # Example
///
/// ```
/// use encore_config::EncoreConfig;
///
/// let config = EncoreConfig::default();
/// assert_eq!(config.session.scheme, "Cookies");
/// assert_eq!(config.body.max_bytes, 1024 * 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EncoreConfig {
    /// Session and cookie settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Request body settings.
    #[serde(default)]
    pub body: BodyConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl EncoreConfig {
    /// Development preset: pretty, colored, debug-level logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                include_location: true,
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON logs and secure session cookies.
    #[must_use]
    pub fn production() -> Self {
        Self {
            session: SessionConfig {
                secure: true,
                ..SessionConfig::default()
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
                ansi_enabled: false,
                include_location: false,
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("session.scheme", &self.session.scheme),
            ("session.cookie_name", &self.session.cookie_name),
            ("session.cart_cookie", &self.session.cart_cookie),
            ("session.admin_role", &self.session.admin_role),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }

        for (field, value) in [
            ("session.cookie_name", &self.session.cookie_name),
            ("session.cart_cookie", &self.session.cart_cookie),
        ] {
            if !is_cookie_name(value) {
                return Err(ConfigError::invalid_value(
                    field,
                    "contains characters not allowed in a cookie name",
                ));
            }
        }

        if self.session.cookie_name == self.session.cart_cookie {
            return Err(ConfigError::validation_error(
                "session.cookie_name and session.cart_cookie must differ",
            ));
        }

        if self.body.max_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "body.max_bytes",
                "must be greater than zero",
            ));
        }

        if !is_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("'{}' is not a valid filter directive", self.logging.level),
            ));
        }

        Ok(())
    }
}

fn is_cookie_name(name: &str) -> bool {
    name.bytes().all(|b| {
        b.is_ascii_graphic()
            && !matches!(
                b,
                b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/'
                    | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
            )
    })
}

/// Accepts `level` or a comma list of `target=level` directives.
fn is_filter(filter: &str) -> bool {
    !filter.trim().is_empty()
        && filter.split(',').all(|directive| {
            let directive = directive.trim();
            let level = match directive.rsplit_once('=') {
                Some((target, level)) if !target.is_empty() => level,
                Some(_) => return false,
                None => directive,
            };
            LEVELS.contains(&level.to_ascii_lowercase().as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EncoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let dev = EncoreConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.validate().is_ok());

        let prod = EncoreConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.session.secure);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_empty_scheme_rejected() {
        let mut config = EncoreConfig::default();
        config.session.scheme = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.scheme"));
    }

    #[test]
    fn test_cookie_name_with_separator_rejected() {
        let mut config = EncoreConfig::default();
        config.session.cart_cookie = "cart;id".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cookie_names_must_differ() {
        let mut config = EncoreConfig::default();
        config.session.cookie_name = "cartId".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let mut config = EncoreConfig::default();
        config.body.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_directives() {
        assert!(is_filter("info"));
        assert!(is_filter("WARN"));
        assert!(is_filter("encore_extract=debug,info"));
        assert!(!is_filter("verbose"));
        assert!(!is_filter("=debug"));
        assert!(!is_filter(""));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: EncoreConfig = toml::from_str(
            r#"
            [session]
            cart_cookie = "basket"

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.cart_cookie, "basket");
        assert_eq!(config.session.scheme, "Cookies");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.body.max_bytes, 1024 * 1024);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<EncoreConfig, _> = toml::from_str("[server]\nport = 80\n");
        assert!(result.is_err());
    }
}
