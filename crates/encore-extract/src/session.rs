//! Session and identity extraction.
//!
//! [`Session`] owns the memoized identity lookup for a pipeline. The derived
//! checks ([`is_authenticated`](Session::is_authenticated),
//! [`is_admin`](Session::is_admin)) are built on that one handle, so however
//! many gates and views ask, the authenticator is consulted once per request.

use encore_core::{EncoreError, Identity, Task};

/// Default role name that grants admin rights.
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Identity lookup and sign-in/sign-out tasks for one pipeline.
///
/// # Example
///
/// ```rust
/// use encore_core::RequestEnv;
/// use encore_extract::Session;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let session = Session::new();
/// let env = RequestEnv::builder().build();
///
/// // The default authenticator never recognises anyone.
/// assert_eq!(session.get_auth().run(&env).await.unwrap(), None);
/// assert!(!session.is_admin().run(&env).await.unwrap());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    admin_role: String,
    get_auth: Task<Option<Identity>>,
    is_authenticated: Task<bool>,
    is_admin: Task<bool>,
}

impl Session {
    /// Creates a session layer where the `admin` role grants admin rights.
    #[must_use]
    pub fn new() -> Self {
        Self::with_admin_role(DEFAULT_ADMIN_ROLE)
    }

    /// Creates a session layer with a custom admin role name.
    #[must_use]
    pub fn with_admin_role(admin_role: impl Into<String>) -> Self {
        let admin_role = admin_role.into();
        let get_auth = authenticate().memo();
        let is_authenticated = get_auth.map(|identity| identity.is_some());
        let role = admin_role.clone();
        let is_admin = get_auth.map(move |identity| {
            identity
                .as_ref()
                .is_some_and(|identity| identity.has_role(&role))
        });
        Self {
            admin_role,
            get_auth,
            is_authenticated,
            is_admin,
        }
    }

    /// Returns the role name that grants admin rights.
    #[must_use]
    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    /// The memoized identity of the caller.
    ///
    /// `None` when nobody is signed in, and also when authentication succeeded
    /// but the name or role claim is missing.
    pub fn get_auth(&self) -> Task<Option<Identity>> {
        self.get_auth.clone()
    }

    /// Whether the caller has an identity.
    pub fn is_authenticated(&self) -> Task<bool> {
        self.is_authenticated.clone()
    }

    /// Whether the caller has an identity in the admin role.
    pub fn is_admin(&self) -> Task<bool> {
        self.is_admin.clone()
    }

    /// Establishes a session carrying exactly the name and role claims.
    ///
    /// An identity already memoized for this request is not refreshed.
    pub fn sign_in(&self, identity: Identity) -> Task<()> {
        Task::from_async(move |env| {
            let claims = identity.to_claims();
            Box::pin(async move {
                env.authenticator()
                    .sign_in(env.scheme(), claims, env)
                    .await
                    .map_err(|err| EncoreError::authentication(format!("{err:#}")))
            })
        })
    }

    /// Invalidates the current session.
    pub fn sign_out(&self) -> Task<()> {
        Task::from_async(|env| {
            Box::pin(async move {
                env.authenticator()
                    .sign_out(env.scheme(), env)
                    .await
                    .map_err(|err| EncoreError::authentication(format!("{err:#}")))
            })
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn authenticate() -> Task<Option<Identity>> {
    Task::from_async(|env| {
        Box::pin(async move {
            let claims = env
                .authenticator()
                .authenticate(env.scheme(), env)
                .await
                .map_err(|err| EncoreError::authentication(format!("{err:#}")))?;

            let identity = claims.as_ref().and_then(Identity::from_claims);
            if claims.is_some() && identity.is_none() {
                tracing::debug!(
                    request_id = %env.request_id(),
                    scheme = env.scheme(),
                    "authenticated without name and role claims; treating as anonymous"
                );
            }
            Ok(identity)
        })
    })
}
