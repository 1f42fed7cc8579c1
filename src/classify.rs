//! Request classification.
//!
//! Assigns each intercepted request to exactly one [`RequestClass`]. The
//! rules are checked in order and the first match wins:
//!
//! 1. browser-extension scheme → [`RequestClass::Ignored`]
//! 2. hostname is the API host → [`RequestClass::ExternalApi`]
//! 3. navigation mode, or accept hint lists HTML → [`RequestClass::Navigation`]
//! 4. same origin as the app → [`RequestClass::SameOriginAsset`]
//! 5. anything else → [`RequestClass::Other`]

use std::fmt;

use crate::config::Scope;
use crate::types::Request;

/// URL schemes used by browser extensions. Requests on these are never
/// intercepted.
const EXTENSION_SCHEMES: &[&str] = &[
    "chrome-extension",
    "moz-extension",
    "safari-extension",
    "safari-web-extension",
    "ms-browser-extension",
];

/// Which strategy handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Not intercepted; the host handles it natively.
    Ignored,
    /// The fixed external JSON API (network-first).
    ExternalApi,
    /// HTML document loads (cache-first, offline page fallback).
    Navigation,
    /// Static files from the app origin (cache-first, network fill).
    SameOriginAsset,
    /// Third-party resources (network-first, silent cache fallback).
    Other,
}

impl RequestClass {
    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Ignored => "ignored",
            RequestClass::ExternalApi => "api",
            RequestClass::Navigation => "navigation",
            RequestClass::SameOriginAsset => "asset",
            RequestClass::Other => "other",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `request` for an app served from `scope.origin`.
pub fn classify(request: &Request, scope: &Scope) -> RequestClass {
    if EXTENSION_SCHEMES.contains(&request.scheme()) {
        return RequestClass::Ignored;
    }
    if request
        .hostname()
        .is_some_and(|host| host.eq_ignore_ascii_case(&scope.api_host))
    {
        return RequestClass::ExternalApi;
    }
    if request.is_navigation() || request.accepts_html() {
        return RequestClass::Navigation;
    }
    if request.origin() == scope.origin {
        return RequestClass::SameOriginAsset;
    }
    RequestClass::Other
}
