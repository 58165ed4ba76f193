//! # Encore Config
//!
//! Typed configuration for the Encore request pipeline.
//!
//! Values are layered, later layers winning: defaults, then a TOML or JSON
//! file, then `.env`, then `ENCORE__SECTION__KEY` environment variables.
//!
//! ```toml
//! [session]
//! scheme = "Cookies"
//! cookie_name = ".encore.session"
//! cart_cookie = "cartId"
//! admin_role = "admin"
//!
//! [body]
//! max_bytes = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! ```
//! use encore_config::{ConfigLoader, LogFormat};
//!
//! # fn main() -> Result<(), encore_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_string("[logging]\nformat = \"pretty\"\n", "toml")?
//!     .load()?;
//! assert_eq!(config.logging.format, LogFormat::Pretty);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/encore-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::EncoreConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{BodyConfig, LogFormat, LoggingConfig, MetricsConfig, SessionConfig};
