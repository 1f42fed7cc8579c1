//! Intercepted request types

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Result;

/// Media type that marks a request as wanting an HTML document.
const HTML_MEDIA_TYPE: &str = "text/html";

/// How the page issued the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An intercepted outbound request.
///
/// Immutable once built; classification is a pure function of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: Url,
    method: String,
    mode: RequestMode,
    accept: Option<String>,
}

impl Request {
    /// Build a request with an explicit method. The method is upper-cased.
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self {
            url,
            method: method.as_ref().to_ascii_uppercase(),
            mode: RequestMode::default(),
            accept: None,
        }
    }

    /// Parse `url` and build a GET request.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new("GET", Url::parse(url)?))
    }

    /// Build a GET navigation request accepting HTML, like a browser
    /// following a link.
    pub fn navigate(url: &str) -> Result<Self> {
        Ok(Self::get(url)?
            .mode(RequestMode::Navigate)
            .accept("text/html,application/xhtml+xml"))
    }

    /// Set the request mode.
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the `accept` hint.
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn request_mode(&self) -> RequestMode {
        self.mode
    }

    pub fn accept_hint(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// ASCII serialization of the URL origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the accept hint lists an HTML media type.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.to_ascii_lowercase().contains(HTML_MEDIA_TYPE))
    }

    /// Identity of this request inside a cache store.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized request identity: upper-case method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Key for a GET of `url`.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> Self {
        request.key()
    }
}
