//! Wiring a configuration into the pipeline's shared pieces.

use bytes::Bytes;
use encore_config::{ConfigError, ConfigLoader, EncoreConfig, DEFAULT_ENV_PREFIX};
use encore_core::{Authenticator, BoxError, RequestEnv};
use encore_extract::{BodyParser, CookieSessionAuthenticator, Session};
use encore_middleware::{Resource, ResourceBuilder};
use encore_render::{Negotiator, StoreContext, TemplateEngine};
use encore_telemetry::TelemetryError;
use http_body::Body;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while starting an application.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// The shared pieces of one application, built from an [`EncoreConfig`].
///
/// One `Encore` value is built at startup. Every resource it builds shares the
/// same [`Session`] and [`BodyParser`] handles, so the identity lookup and the
/// body read each happen at most once per request.
///
/// # Example
///
/// ```
/// use encore::{Encore, EncoreConfig};
///
/// let app = Encore::new(EncoreConfig::default()).unwrap();
/// assert_eq!(app.config().session.scheme, "Cookies");
/// assert_eq!(app.body_parser().max_bytes(), 1024 * 1024);
/// ```
#[derive(Clone)]
pub struct Encore {
    config: Arc<EncoreConfig>,
    authenticator: Arc<dyn Authenticator>,
    session: Session,
    body: BodyParser,
}

impl Encore {
    /// Builds an application with a [`CookieSessionAuthenticator`] configured
    /// from the `session` section.
    ///
    /// # Errors
    ///
    /// Returns the validation failure if `config` is invalid.
    pub fn new(config: EncoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut sessions = CookieSessionAuthenticator::new()
            .scheme(&config.session.scheme)
            .cookie_name(&config.session.cookie_name)
            .secure(config.session.secure);
        if let Some(seconds) = config.session.max_age_secs {
            sessions = sessions.max_age_secs(seconds);
        }

        Ok(Self {
            session: Session::with_admin_role(&config.session.admin_role),
            body: BodyParser::new(config.body.max_bytes),
            authenticator: Arc::new(sessions),
            config: Arc::new(config),
        })
    }

    /// Loads configuration from an optional file, `.env`, and `ENCORE__*`
    /// variables, then builds the application.
    ///
    /// # Errors
    ///
    /// Returns any loading or validation failure.
    pub fn from_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::new()
            .with_optional_file(path)?
            .with_dotenv()?
            .with_env_prefix(DEFAULT_ENV_PREFIX)
            .load()?;
        Self::new(config)
    }

    /// Replaces the authentication collaborator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Installs logging and, if enabled, the metrics recorder.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber or recorder is already installed.
    pub fn init_telemetry(&self) -> Result<(), StartupError> {
        encore_telemetry::init_logging(&self.config.logging.to_log_config())?;
        if self.config.metrics.enabled {
            encore_telemetry::init_metrics(&self.config.metrics.to_metrics_config())?;
        }
        tracing::info!(
            scheme = %self.config.session.scheme,
            max_body_bytes = self.config.body.max_bytes,
            "encore initialised"
        );
        Ok(())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EncoreConfig {
        &self.config
    }

    /// Returns the shared session layer.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the shared body parser.
    #[must_use]
    pub fn body_parser(&self) -> &BodyParser {
        &self.body
    }

    /// Returns the authentication collaborator.
    #[must_use]
    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        Arc::clone(&self.authenticator)
    }

    /// Builds a negotiator over `store` and `templates` with the configured
    /// cart cookie and the shared session.
    pub fn negotiator<S, R>(&self, store: Arc<S>, templates: Arc<R>) -> Negotiator<S, R>
    where
        S: StoreContext,
        R: TemplateEngine,
    {
        Negotiator::new(store, templates, self.session.clone())
            .with_cart_cookie(&self.config.session.cart_cookie)
    }

    /// Starts a resource whose gate failures render through `negotiator`.
    pub fn resource<S, R>(&self, name: &'static str, negotiator: &Negotiator<S, R>) -> ResourceBuilder
    where
        S: StoreContext,
        R: TemplateEngine,
    {
        Resource::builder(name, self.session.clone(), Arc::new(negotiator.clone()))
    }

    /// Builds the environment for an incoming request.
    pub fn request_env<B>(&self, request: http::Request<B>) -> RequestEnv
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        RequestEnv::from_request_with_scheme(
            request,
            self.authenticator(),
            self.config.session.scheme.clone(),
        )
    }
}

impl std::fmt::Debug for Encore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encore")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
