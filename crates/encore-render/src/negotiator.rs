//! Rendering a domain value in the negotiated media type.
//!
//! JSON is produced by serializing the fetched value. HTML goes through the
//! [`TemplateEngine`] with a [`ViewBag`] describing the caller and their cart.
//! Nothing else is produced: asking for another type is a server
//! configuration error.

use crate::representation::Representation;
use crate::store::{cart_count, StoreContext};
use crate::template::{keys, TemplateEngine, ViewBag};
use encore_core::{BoxFuture, EncoreError, EncoreResult, RequestEnv};
use encore_extract::{get_cookie, Negotiation, Session};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Default name of the anonymous cart cookie.
pub const DEFAULT_CART_COOKIE: &str = "cartId";

/// View rendered when a caller must sign in.
pub const LOGON_VIEW: &str = "logon";

/// View rendered when a caller lacks rights.
pub const FORBIDDEN_VIEW: &str = "forbidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Html,
}

fn select_format(negotiation: &Negotiation) -> EncoreResult<Format> {
    let Negotiation::Negotiated(types) = negotiation else {
        return Ok(Format::Json);
    };
    let Some(first) = types.first() else {
        return Err(EncoreError::unsupported_representation("none acceptable"));
    };
    match (first.type_(), first.subtype()) {
        (mime::APPLICATION, mime::JSON) => Ok(Format::Json),
        (mime::TEXT, mime::HTML) => Ok(Format::Html),
        _ => {
            tracing::error!(
                media_type = %first,
                "configuration error: resource negotiated a media type the renderer cannot produce"
            );
            Err(EncoreError::unsupported_representation(first.essence_str()))
        }
    }
}

/// The authorization failure pages, object-safe for use by gates.
pub trait FailureViews: Send + Sync + 'static {
    /// Renders the sign-in page pointing back at `return_url`.
    fn unauthorized<'a>(
        &'a self,
        env: &'a RequestEnv,
        return_url: &'a str,
    ) -> BoxFuture<'a, EncoreResult<Representation>>;

    /// Renders the access-denied page.
    fn forbidden<'a>(&'a self, env: &'a RequestEnv) -> BoxFuture<'a, EncoreResult<Representation>>;
}

/// Turns fetched values into representations.
///
/// # Example
///
/// ```rust
/// use encore_core::RequestEnv;
/// use encore_extract::{Negotiation, Session};
/// use encore_render::{CartLine, Negotiator, StoreContext, TemplateEngine, ViewBag};
/// use std::sync::Arc;
///
/// struct Store;
/// impl StoreContext for Store {
///     type Handle = ();
///     fn open(&self) -> anyhow::Result<()> { Ok(()) }
///     fn cart_lines(&self, _: &mut (), _: &str) -> anyhow::Result<Vec<CartLine>> { Ok(vec![]) }
/// }
///
/// struct Views;
/// impl TemplateEngine for Views {
///     fn render(&self, view: &str, _: &serde_json::Value, _: &ViewBag) -> anyhow::Result<String> {
///         Ok(format!("<h1>{view}</h1>"))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let negotiator = Negotiator::new(Arc::new(Store), Arc::new(Views), Session::new());
/// let env = RequestEnv::builder().build();
///
/// let rep = negotiator
///     .represent(&env, &Negotiation::Free, "genres", |_| Ok(vec!["Rock", "Jazz"]))
///     .await
///     .unwrap();
/// assert_eq!(rep.text(), Some(r#"["Rock","Jazz"]"#));
/// # }
/// ```
pub struct Negotiator<S, R> {
    store: Arc<S>,
    templates: Arc<R>,
    session: Session,
    cart_cookie: String,
}

impl<S, R> Clone for Negotiator<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            templates: Arc::clone(&self.templates),
            session: self.session.clone(),
            cart_cookie: self.cart_cookie.clone(),
        }
    }
}

impl<S, R> std::fmt::Debug for Negotiator<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("cart_cookie", &self.cart_cookie)
            .finish_non_exhaustive()
    }
}

impl<S: StoreContext, R: TemplateEngine> Negotiator<S, R> {
    /// Creates a negotiator over the given collaborators.
    ///
    /// `session` should be the pipeline's shared session so the identity
    /// lookup is memoized together with the gates.
    #[must_use]
    pub fn new(store: Arc<S>, templates: Arc<R>, session: Session) -> Self {
        Self {
            store,
            templates,
            session,
            cart_cookie: DEFAULT_CART_COOKIE.to_string(),
        }
    }

    /// Sets the anonymous cart cookie name.
    #[must_use]
    pub fn with_cart_cookie(mut self, name: impl Into<String>) -> Self {
        self.cart_cookie = name.into();
        self
    }

    /// Returns the session layer.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches a value from a fresh store handle and renders it.
    ///
    /// [`Negotiation::Free`] and a leading JSON type produce compact JSON;
    /// a leading HTML type renders `view` with the value as its model.
    ///
    /// # Errors
    ///
    /// Store and template failures are [`EncoreError::Upstream`]. A leading
    /// type other than JSON or HTML is [`EncoreError::UnsupportedRepresentation`].
    pub async fn represent<T, F>(
        &self,
        env: &RequestEnv,
        negotiation: &Negotiation,
        view: &str,
        fetch: F,
    ) -> EncoreResult<Representation>
    where
        T: Serialize + Send,
        F: FnOnce(&mut S::Handle) -> anyhow::Result<T> + Send,
    {
        let format = select_format(negotiation)?;
        let mut handle = self.open()?;
        let value = fetch(&mut handle).map_err(|e| EncoreError::upstream("store", e))?;

        tracing::debug!(
            request_id = %env.request_id(),
            view,
            media_type = ?format,
            "rendering representation"
        );

        match format {
            Format::Json => serde_json::to_vec(&value)
                .map(Representation::json)
                .map_err(|e| EncoreError::internal(format!("failed to serialize {view}: {e}"))),
            Format::Html => {
                let model = serde_json::to_value(&value).map_err(|e| {
                    EncoreError::internal(format!("failed to serialize {view}: {e}"))
                })?;
                self.render_html(env, &mut handle, view, &model).await
            }
        }
    }

    /// Renders the `logon` view with `{ReturnUrl, ValidationMsg: ""}`.
    pub async fn unauthorized(&self, env: &RequestEnv, return_url: &str) -> EncoreResult<Representation> {
        let model = json!({ "ReturnUrl": return_url, "ValidationMsg": "" });
        let mut handle = self.open()?;
        self.render_html(env, &mut handle, LOGON_VIEW, &model).await
    }

    /// Renders the `forbidden` view with an empty model.
    pub async fn forbidden(&self, env: &RequestEnv) -> EncoreResult<Representation> {
        let mut handle = self.open()?;
        self.render_html(env, &mut handle, FORBIDDEN_VIEW, &json!({})).await
    }

    /// Builds the view bag for the current caller.
    ///
    /// A signed-in caller's cart is keyed by user name; otherwise the cart
    /// cookie is used. With neither, the bag is empty.
    pub async fn view_bag(&self, env: &RequestEnv, handle: &mut S::Handle) -> EncoreResult<ViewBag> {
        let mut bag = ViewBag::new();
        let identity = self.session.get_auth().run(env).await?;

        let cart_key = match identity {
            Some(identity) => {
                let key = identity.user_name.clone();
                bag.insert(
                    keys::USER,
                    serde_json::to_value(&identity)
                        .map_err(|e| EncoreError::internal(e.to_string()))?,
                );
                Some(key)
            }
            None => get_cookie(self.cart_cookie.clone())
                .run(env)
                .await?
                .filter(|id| !id.is_empty()),
        };

        if let Some(key) = cart_key {
            let lines = self
                .store
                .cart_lines(handle, &key)
                .map_err(|e| EncoreError::upstream("store", e))?;
            bag.insert(keys::CART_COUNT, cart_count(&lines));
            bag.insert(keys::CART_ID, key);
        }
        Ok(bag)
    }

    fn open(&self) -> EncoreResult<S::Handle> {
        self.store
            .open()
            .map_err(|e| EncoreError::upstream("store", e))
    }

    async fn render_html(
        &self,
        env: &RequestEnv,
        handle: &mut S::Handle,
        view: &str,
        model: &Value,
    ) -> EncoreResult<Representation> {
        let bag = self.view_bag(env, handle).await?;
        let markup = self
            .templates
            .render(view, model, &bag)
            .map_err(|e| EncoreError::upstream("template", e))?;
        Ok(Representation::html(markup))
    }
}

impl<S: StoreContext, R: TemplateEngine> FailureViews for Negotiator<S, R> {
    fn unauthorized<'a>(
        &'a self,
        env: &'a RequestEnv,
        return_url: &'a str,
    ) -> BoxFuture<'a, EncoreResult<Representation>> {
        Box::pin(Negotiator::unauthorized(self, env, return_url))
    }

    fn forbidden<'a>(&'a self, env: &'a RequestEnv) -> BoxFuture<'a, EncoreResult<Representation>> {
        Box::pin(Negotiator::forbidden(self, env))
    }
}
