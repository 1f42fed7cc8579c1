//! Response snapshots.
//!
//! A [`Snapshot`] is a response as seen by the agent: status, headers and a
//! body that can be read exactly once. Reading the body consumes the
//! snapshot, so a consumer that needs to both return a response and store
//! it must call [`Snapshot::duplicate`] first and use the two halves
//! independently. Stores keep the [`StoredSnapshot`] form, which is plain
//! data and hands out fresh snapshots on every lookup.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Body of the 503 returned for uncached assets while offline.
pub const SERVICE_UNAVAILABLE_BODY: &str = "Service Unavailable: offline and resource not cached";

/// Origin class of a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Same-origin network response.
    Basic,
    /// Cross-origin network response readable by the page.
    Cors,
    /// Cross-origin response whose status and body are hidden.
    Opaque,
    /// Built locally rather than received from the network.
    #[default]
    Synthetic,
}

/// A single-use response.
///
/// Deliberately not `Clone`: use [`duplicate`](Self::duplicate).
#[derive(Debug)]
pub struct Snapshot {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    kind: ResponseKind,
    url: Option<String>,
}

impl Snapshot {
    /// Build a synthetic response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseKind::Synthetic,
            url: None,
        }
    }

    /// `200` with body `[]`, served for API requests that can be answered
    /// neither by the network nor by the store.
    pub fn empty_json_array() -> Self {
        Self::new(200, Bytes::from_static(b"[]")).with_header("content-type", "application/json")
    }

    /// `503` served for uncached non-HTML assets while offline.
    pub fn service_unavailable() -> Self {
        Self::new(503, Bytes::from_static(SERVICE_UNAVAILABLE_BODY.as_bytes()))
            .with_header("content-type", "text/plain")
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record the final URL the response was served from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is in `200..=299`.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Split into two independently consumable copies.
    pub fn duplicate(self) -> (Snapshot, Snapshot) {
        let copy = Snapshot {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: self.kind,
            url: self.url.clone(),
        };
        (self, copy)
    }

    /// Consume the snapshot and return its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consume the snapshot and decode its body as UTF-8 (lossy).
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consume the snapshot and decode its body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Consume the snapshot into its storable form.
    pub fn into_stored(self) -> StoredSnapshot {
        StoredSnapshot {
            status: self.status,
            headers: self.headers,
            body: self.body,
            kind: self.kind,
            url: self.url,
        }
    }
}

/// Persisted form of a [`Snapshot`].
///
/// Every call to [`to_snapshot`](Self::to_snapshot) yields a fresh,
/// independently consumable response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(with = "base64_body")]
    pub body: Bytes,
    #[serde(default)]
    pub kind: ResponseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StoredSnapshot {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: self.kind,
            url: self.url.clone(),
        }
    }
}

mod base64_body {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_yields_independent_bodies() {
        let (a, b) = Snapshot::new(200, "hello").duplicate();
        assert_eq!(b.into_body(), Bytes::from_static(b"hello"));
        assert_eq!(a.text(), "hello");
    }

    #[test]
    fn ok_range() {
        assert!(Snapshot::new(200, "").is_ok());
        assert!(Snapshot::new(299, "").is_ok());
        assert!(!Snapshot::new(304, "").is_ok());
        assert!(!Snapshot::new(500, "").is_ok());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let snapshot = Snapshot::new(200, "").with_header("Content-Type", "text/css");
        assert_eq!(snapshot.header("content-type"), Some("text/css"));
        assert_eq!(snapshot.header("vary"), None);
    }

    #[test]
    fn empty_json_array_shape() {
        let snapshot = Snapshot::empty_json_array();
        assert_eq!(snapshot.status(), 200);
        assert_eq!(snapshot.header("content-type"), Some("application/json"));
        let items: Vec<serde_json::Value> = snapshot.json().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn service_unavailable_shape() {
        let snapshot = Snapshot::service_unavailable();
        assert_eq!(snapshot.status(), 503);
        assert_eq!(snapshot.text(), SERVICE_UNAVAILABLE_BODY);
    }

    #[test]
    fn stored_body_survives_json() {
        let stored = Snapshot::new(200, vec![0u8, 159, 146, 150])
            .with_header("content-type", "application/octet-stream")
            .into_stored();
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}
