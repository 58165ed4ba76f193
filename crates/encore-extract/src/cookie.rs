//! Cookie parsing, `Set-Cookie` building and the cookie tasks.
//!
//! Reads always see the request-time `Cookie` header. Writes only append to
//! the response side of the environment, so a cookie set earlier in the same
//! request is not visible to a later [`get_cookie`].
//!
//! When the same name is sent twice, the first occurrence wins: browsers send
//! the most path-specific cookie first.
//!
//! Values written to `Set-Cookie` are percent-encoded wherever a byte is not a
//! valid cookie octet, so a value can never add attributes. Names must be
//! HTTP tokens; writing a cookie with any other name fails.
//!
//! # Example
//!
//! ```rust
//! use encore_extract::cookie::{SameSite, SetCookie};
//!
//! let cookie = SetCookie::new("cartId", "c-42")
//!     .path("/")
//!     .http_only(true)
//!     .same_site(SameSite::Lax);
//!
//! assert_eq!(cookie.to_header_value(), "cartId=c-42; Path=/; HttpOnly; SameSite=Lax");
//! ```

use encore_core::{EncoreError, EncoreResult, RequestEnv, Task};
use http::{header, HeaderMap};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

/// Request cookies parsed from every `Cookie` header.
///
/// # Example
///
/// ```rust
/// use encore_extract::cookie::Cookies;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     http::header::COOKIE,
///     HeaderValue::from_static("session=abc123; theme=dark"),
/// );
///
/// let cookies = Cookies::from_headers(&headers);
/// assert_eq!(cookies.get("session"), Some("abc123"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    cookies: HashMap<String, String>,
}

impl Cookies {
    /// Create an empty Cookies instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse cookies from a single `Cookie` header value.
    #[must_use]
    pub fn parse(header_value: &str) -> Self {
        let mut cookies = Self::new();
        cookies.extend_from(header_value);
        cookies
    }

    /// Parse cookies from all `Cookie` headers. Non-UTF-8 values are skipped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::new();
        for value in headers.get_all(header::COOKIE) {
            if let Ok(value) = value.to_str() {
                cookies.extend_from(value);
            }
        }
        cookies
    }

    fn extend_from(&mut self, header_value: &str) {
        for cookie in header_value.split(';') {
            let cookie = cookie.trim();
            if let Some((name, value)) = cookie.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                self.cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    /// Get a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Check if a cookie exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Get the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Cookie is sent with cross-site requests.
    None,
    /// Cookie is sent with same-site and cross-site top-level navigations.
    #[default]
    Lax,
    /// Cookie is only sent with same-site requests.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Lax => write!(f, "Lax"),
            Self::Strict => write!(f, "Strict"),
        }
    }
}

/// Builder for a `Set-Cookie` response header.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<Duration>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Create a new Set-Cookie builder.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Create a cookie that will be removed (Max-Age=0).
    #[must_use]
    pub fn remove(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age_secs(0)
    }

    /// Set the Path attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the Max-Age attribute.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = Some(duration);
        self
    }

    /// Set the Max-Age attribute in seconds.
    #[must_use]
    pub fn max_age_secs(self, seconds: u64) -> Self {
        self.max_age(Duration::from_secs(seconds))
    }

    /// Set the Secure attribute.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `HttpOnly` attribute.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the `SameSite` attribute.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Get the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Convert to a Set-Cookie header value.
    ///
    /// The value is percent-encoded where it holds bytes that are not cookie
    /// octets.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, encode_value(&self.value))];

        if let Some(ref path) = self.path {
            parts.push(format!("Path={path}"));
        }

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }

        if self.secure {
            parts.push("Secure".to_string());
        }

        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={same_site}"));
        }

        parts.join("; ")
    }

    /// Appends this cookie to the response side of `env`.
    ///
    /// # Errors
    ///
    /// Fails if the name is not an HTTP token or the path holds a `;` or a
    /// control character.
    pub fn write_to(&self, env: &RequestEnv) -> EncoreResult<()> {
        if self.name.is_empty() || !self.name.bytes().all(is_token_byte) {
            return Err(EncoreError::internal(format!(
                "invalid cookie name '{}'",
                self.name.escape_debug()
            )));
        }
        if let Some(path) = &self.path {
            if path.bytes().any(|b| b == b';' || b.is_ascii_control()) {
                return Err(EncoreError::internal(format!(
                    "invalid path for cookie '{}'",
                    self.name
                )));
            }
        }
        env.append_set_cookie(self.to_header_value());
        Ok(())
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// `cookie-octet`: printable ASCII except space, `"`, `,`, `;` and `\`.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn encode_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for b in value.bytes() {
        if is_cookie_octet(b) {
            encoded.push(char::from(b));
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }
    }
    encoded
}

/// Reads a request cookie. A missing cookie is `None`; an empty one is `Some("")`.
pub fn get_cookie(key: impl Into<String>) -> Task<Option<String>> {
    let key = key.into();
    Task::from_fn(move |env| Ok(Cookies::from_headers(env.headers()).get(&key).map(str::to_string)))
}

/// Writes a site-wide cookie to the response.
pub fn set_cookie(key: impl Into<String>, value: impl Into<String>) -> Task<()> {
    let cookie = SetCookie::new(key, value).path("/");
    Task::from_fn(move |env| cookie.write_to(env))
}

/// Expires a site-wide cookie on the client.
pub fn delete_cookie(key: impl Into<String>) -> Task<()> {
    let cookie = SetCookie::remove(key).path("/");
    Task::from_fn(move |env| cookie.write_to(env))
}
