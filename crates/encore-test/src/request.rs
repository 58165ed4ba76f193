//! Request environment building for tests.

use encore_core::{Authenticator, RequestEnv, RequestEnvBuilder, RequestId};
use http::{header, Method};
use serde::Serialize;
use std::sync::Arc;

/// Fluent builder for a [`RequestEnv`] as a browser or API client would send it.
#[must_use]
pub struct TestEnv {
    builder: RequestEnvBuilder,
    cookies: Vec<String>,
}

impl TestEnv {
    /// Starts a request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> Self {
        Self {
            builder: RequestEnv::builder().method(method).uri(uri),
            cookies: Vec::new(),
        }
    }

    /// A GET request.
    pub fn get(uri: &str) -> Self {
        Self::request(Method::GET, uri)
    }

    /// A POST request.
    pub fn post(uri: &str) -> Self {
        Self::request(Method::POST, uri)
    }

    /// A PUT request.
    pub fn put(uri: &str) -> Self {
        Self::request(Method::PUT, uri)
    }

    /// A DELETE request.
    pub fn delete(uri: &str) -> Self {
        Self::request(Method::DELETE, uri)
    }

    /// Appends a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Accept` header.
    pub fn accept(self, value: &str) -> Self {
        self.header(header::ACCEPT.as_str(), value)
    }

    /// Adds a request cookie.
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(format!("{name}={value}"));
        self
    }

    /// Sends a URL-encoded form body.
    pub fn form(mut self, body: &str) -> Self {
        self.builder = self
            .builder
            .header(header::CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
            .body(body.to_string());
        self
    }

    /// Sends a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        let body = serde_json::to_vec(value).expect("serializable JSON body");
        self.builder = self
            .builder
            .header(header::CONTENT_TYPE.as_str(), "application/json")
            .body(body);
        self
    }

    /// Sends a body with an explicit content type.
    pub fn body(mut self, content_type: &str, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self
            .builder
            .header(header::CONTENT_TYPE.as_str(), content_type)
            .body(body);
        self
    }

    /// Sets the authentication collaborator.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.builder = self.builder.authenticator(authenticator);
        self
    }

    /// Sets the authentication scheme name.
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.builder = self.builder.scheme(scheme);
        self
    }

    /// Sets the request ID.
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.builder = self.builder.request_id(id);
        self
    }

    /// Builds the environment.
    #[must_use]
    pub fn build(self) -> RequestEnv {
        let mut builder = self.builder;
        if !self.cookies.is_empty() {
            builder = builder.header(header::COOKIE.as_str(), &self.cookies.join("; "));
        }
        builder.build()
    }
}
