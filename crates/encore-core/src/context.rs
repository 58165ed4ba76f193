//! Request environment types.
//!
//! A [`RequestEnv`] is created for exactly one request and handed by reference
//! to every [`Task`](crate::Task) evaluated for it. The request side is fixed
//! at construction. The response side (status override, headers, cookies) is
//! written through `&self` and collected by the transport at the end.

use crate::auth::{AnonymousAuthenticator, Authenticator};
use crate::effect::MemoKey;
use crate::error::{EncoreError, EncoreResult};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Boxed error type carried by request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The type-erased request body.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Default authentication scheme name.
pub const DEFAULT_SCHEME: &str = "Cookies";

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use encore_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Response-side state accumulated while a request is processed.
#[derive(Debug, Clone, Default)]
pub struct ResponseParts {
    /// Status override, if any stage set one.
    pub status: Option<StatusCode>,
    /// Extra response headers.
    pub headers: HeaderMap,
    /// `Set-Cookie` header values, in the order they were written.
    pub set_cookies: Vec<String>,
}

impl ResponseParts {
    /// Copies the accumulated headers and cookies onto `headers`.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.append(name.clone(), value.clone());
        }
        for cookie in &self.set_cookies {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                headers.append(http::header::SET_COOKIE, value);
            }
        }
    }
}

type MemoSlot = Arc<dyn Any + Send + Sync>;

/// Per-request environment threaded through every task.
///
/// # Example
///
/// ```
/// use encore_core::RequestEnv;
/// use http::Method;
///
/// let env = RequestEnv::builder()
///     .method(Method::POST)
///     .uri("/albums?page=2")
///     .header("content-type", "application/json")
///     .body(r#"{"title":"Foo"}"#)
///     .build();
///
/// assert_eq!(env.method(), &Method::POST);
/// assert_eq!(env.path_and_query(), "/albums?page=2");
/// ```
pub struct RequestEnv {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Mutex<Option<RequestBody>>,
    authenticator: Arc<dyn Authenticator>,
    scheme: String,
    response: Mutex<ResponseParts>,
    memo: Mutex<HashMap<MemoKey, MemoSlot>>,
    started_at: Instant,
}

impl RequestEnv {
    /// Starts building an environment. Defaults to `GET /` with no body.
    #[must_use]
    pub fn builder() -> RequestEnvBuilder {
        RequestEnvBuilder::new()
    }

    /// Builds an environment from an incoming `http` request, using the
    /// default authentication scheme.
    pub fn from_request<B>(request: http::Request<B>, authenticator: Arc<dyn Authenticator>) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::from_request_with_scheme(request, authenticator, DEFAULT_SCHEME)
    }

    /// Builds an environment from an incoming `http` request.
    pub fn from_request_with_scheme<B>(
        request: http::Request<B>,
        authenticator: Arc<dyn Authenticator>,
        scheme: impl Into<String>,
    ) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let body = body.map_err(Into::into).boxed_unsync();
        Self::builder()
            .method(parts.method)
            .uri(parts.uri)
            .headers(parts.headers)
            .authenticator(authenticator)
            .scheme(scheme)
            .raw_body(body)
            .build()
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the path and query as the client sent them, `/` if absent.
    #[must_use]
    pub fn path_and_query(&self) -> &str {
        self.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header value as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the authentication collaborator.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Returns the configured authentication scheme name.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns how long this request has been processing.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Takes the one-shot body handle.
    ///
    /// # Errors
    ///
    /// Returns [`EncoreError::BodyConsumed`] if the body was already taken.
    pub fn take_body(&self) -> EncoreResult<RequestBody> {
        self.body.lock().take().ok_or(EncoreError::BodyConsumed)
    }

    /// Returns true if the body handle has not been taken yet.
    #[must_use]
    pub fn body_available(&self) -> bool {
        self.body.lock().is_some()
    }

    /// Overrides the response status.
    pub fn set_status(&self, status: StatusCode) {
        self.response.lock().status = Some(status);
    }

    /// Returns the status override, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.response.lock().status
    }

    /// Appends a response header.
    pub fn append_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.append(name, value);
    }

    /// Appends a `Set-Cookie` value to the response.
    pub fn append_set_cookie(&self, cookie: impl Into<String>) {
        self.response.lock().set_cookies.push(cookie.into());
    }

    /// Returns the `Set-Cookie` values written so far.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<String> {
        self.response.lock().set_cookies.clone()
    }

    /// Moves the accumulated response side out, leaving it empty.
    #[must_use]
    pub fn take_response_parts(&self) -> ResponseParts {
        std::mem::take(&mut *self.response.lock())
    }

    /// Consumes the environment, returning the accumulated response side.
    #[must_use]
    pub fn into_response_parts(self) -> ResponseParts {
        self.response.into_inner()
    }

    /// Returns the memo cell for `key`, creating it on first use.
    pub(crate) fn memo_cell<T>(&self, key: MemoKey) -> EncoreResult<Arc<OnceCell<EncoreResult<T>>>>
    where
        T: Send + Sync + 'static,
    {
        let slot = Arc::clone(
            self.memo
                .lock()
                .entry(key)
                .or_insert_with(|| -> MemoSlot { Arc::new(OnceCell::<EncoreResult<T>>::new()) }),
        );
        slot.downcast::<OnceCell<EncoreResult<T>>>()
            .map_err(|_| EncoreError::internal(format!("{key} holds a value of another type")))
    }
}

impl std::fmt::Debug for RequestEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEnv")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("scheme", &self.scheme)
            .field("body_available", &self.body_available())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestEnv`].
pub struct RequestEnvBuilder {
    request_id: Option<RequestId>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<RequestBody>,
    authenticator: Arc<dyn Authenticator>,
    scheme: String,
}

impl RequestEnvBuilder {
    fn new() -> Self {
        Self {
            request_id: None,
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: None,
            authenticator: Arc::new(AnonymousAuthenticator),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }

    /// Sets the request ID. A fresh one is generated otherwise.
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Sets the request method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request URI. An unparsable URI leaves the current one in place.
    pub fn uri<U>(mut self, uri: U) -> Self
    where
        U: TryInto<Uri>,
    {
        if let Ok(uri) = uri.try_into() {
            self.uri = uri;
        }
        self
    }

    /// Appends a request header. Invalid names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces all request headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets an in-memory request body.
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        let body = Full::new(body.into())
            .map_err(|never: Infallible| match never {})
            .boxed_unsync();
        self.raw_body(body)
    }

    /// Sets a streaming request body.
    pub fn raw_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the authentication collaborator.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Sets the authentication scheme name.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Builds the environment.
    #[must_use]
    pub fn build(self) -> RequestEnv {
        let body = self.body.unwrap_or_else(|| {
            Empty::<Bytes>::new()
                .map_err(|never: Infallible| match never {})
                .boxed_unsync()
        });
        RequestEnv {
            request_id: self.request_id.unwrap_or_default(),
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: Mutex::new(Some(body)),
            authenticator: self.authenticator,
            scheme: self.scheme,
            response: Mutex::new(ResponseParts::default()),
            memo: Mutex::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for RequestEnvBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEnvBuilder")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}
