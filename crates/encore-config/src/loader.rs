//! Layered configuration loading.
//!
//! Layers are applied in order, later layers winning:
//!
//! 1. Built-in defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. Variables from a `.env` file
//! 4. Environment variables, `ENCORE__SECTION__KEY`

use crate::config::EncoreConfig;
use crate::error::ConfigError;
use crate::schema::LogFormat;
use std::env;
use std::path::Path;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "ENCORE";

/// Builder for [`EncoreConfig`].
///
/// # Example
///
/// ```no_run
/// use encore_config::ConfigLoader;
///
/// # fn main() -> Result<(), encore_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("encore.toml")?
///     .with_dotenv()?
///     .with_env_prefix("ENCORE")
///     .load()?;
/// # let _ = config;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: EncoreConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults and no environment prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = EncoreConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = EncoreConfig::production();
        self
    }

    /// Loads a file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, or malformed.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = parse_file(&content, path)?;
        self.file_loaded = true;
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but is unreadable or malformed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Fails on malformed content or an unknown format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {other}"
                )))
            }
        };
        self.file_loaded = true;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Loads `.env` from the working directory into the process environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Returns true if a file or string layer was applied.
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable variable or an invalid final configuration.
    pub fn load(mut self) -> Result<EncoreConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration as it stands, without env overrides or validation.
    pub fn load_unvalidated(self) -> EncoreConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let session = &mut self.config.session;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["SESSION", "SCHEME"] => session.scheme = value.to_string(),
            ["SESSION", "COOKIE_NAME"] => session.cookie_name = value.to_string(),
            ["SESSION", "CART_COOKIE"] => session.cart_cookie = value.to_string(),
            ["SESSION", "ADMIN_ROLE"] => session.admin_role = value.to_string(),
            ["SESSION", "MAX_AGE_SECS"] => {
                session.max_age_secs = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected integer or 'none'")
                    })?)
                };
            }
            ["SESSION", "SECURE"] => {
                session.secure = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["BODY", "MAX_BYTES"] => {
                self.config.body.max_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

fn parse_file(content: &str, path: &Path) -> Result<EncoreConfig, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("toml") => Ok(toml::from_str(content)?),
        Some("json") => Ok(serde_json::from_str(content)?),
        _ => Err(ConfigError::validation_error(format!(
            "unsupported configuration file format: {}",
            path.display()
        ))),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
