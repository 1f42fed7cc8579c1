//! Cache store abstraction.
//!
//! Two traits model the host's keyed cache registry:
//!
//! - [`CacheStorage`]: the registry of named stores for opening, listing and deleting.
//!   Store names are the version tokens, so deleting a store is how stale
//!   content is purged on upgrade.
//! - [`Cache`]: one named store mapping a [`RequestKey`] to a stored
//!   response.
//!
//! Both are injected into the lifecycle manager and the dispatcher rather
//! than reached through global state, so tests can substitute
//! [`MemoryStorage`] and the CLI can use the persistent [`FsStorage`].
//!
//! # Cacheability
//!
//! Every implementation applies [`check_cacheable`] before writing and only
//! matches GET keys. A rejected write surfaces as
//! [`VordrError::StoreWrite`]; callers on the request path log and absorb it.

pub mod fs;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{RequestKey, ResponseKind, Snapshot};
use crate::{Result, VordrError};

pub use fs::{FsCache, FsStorage};
pub use memory::{MemoryCache, MemoryStorage};

/// A single named store.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store name (its version token).
    fn name(&self) -> &str;

    /// Exact-match lookup. Non-GET keys never match.
    async fn match_request(&self, key: &RequestKey) -> Result<Option<Snapshot>>;

    /// Insert or overwrite the entry for `key`.
    ///
    /// Returns [`VordrError::StoreWrite`] if the pair is not cacheable.
    async fn put(&self, key: RequestKey, snapshot: Snapshot) -> Result<()>;

    /// All keys currently held, sorted.
    async fn keys(&self) -> Result<Vec<RequestKey>>;

    /// Remove one entry. Returns whether it existed.
    async fn delete(&self, key: &RequestKey) -> Result<bool>;
}

/// Registry of named stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the store called `name`, creating it if it does not exist.
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>>;

    /// Open the store called `name` only if it already exists.
    ///
    /// Lookups go through this so that reading never creates a store.
    async fn open_existing(&self, name: &str) -> Result<Option<Arc<dyn Cache>>> {
        if self.has(name).await? {
            Ok(Some(self.open(name).await?))
        } else {
            Ok(None)
        }
    }

    /// Whether a store called `name` exists.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Names of every existing store, sorted.
    async fn names(&self) -> Result<Vec<String>>;

    /// Delete a whole store. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Look `key` up in every store, in name order, returning the first hit.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Snapshot>> {
        for name in self.names().await? {
            let Some(store) = self.open_existing(&name).await? else {
                continue;
            };
            if let Some(snapshot) = store.match_request(key).await? {
                return Ok(Some(snapshot));
            }
        }
        Ok(None)
    }
}

/// Reject request/response pairs a browser cache would refuse to store.
pub fn check_cacheable(key: &RequestKey, snapshot: &Snapshot) -> Result<()> {
    if !key.is_get() {
        return Err(VordrError::StoreWrite(format!(
            "{key}: only GET requests can be stored"
        )));
    }
    if snapshot.kind() == ResponseKind::Opaque {
        return Err(VordrError::StoreWrite(format!(
            "{key}: opaque responses cannot be stored"
        )));
    }
    if snapshot.status() == 206 {
        return Err(VordrError::StoreWrite(format!(
            "{key}: partial responses cannot be stored"
        )));
    }
    if snapshot
        .header("vary")
        .is_some_and(|vary| vary.split(',').any(|v| v.trim() == "*"))
    {
        return Err(VordrError::StoreWrite(format!(
            "{key}: responses with `Vary: *` cannot be stored"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(method: &str) -> RequestKey {
        RequestKey::new(method, &Url::parse("https://app.example.org/a").unwrap())
    }

    #[test]
    fn plain_get_is_cacheable() {
        assert!(check_cacheable(&key("GET"), &Snapshot::new(200, "x")).is_ok());
    }

    #[test]
    fn error_statuses_are_cacheable() {
        // Only the strategies decide not to store non-ok answers.
        assert!(check_cacheable(&key("GET"), &Snapshot::new(404, "x")).is_ok());
    }

    #[test]
    fn post_is_rejected() {
        let err = check_cacheable(&key("POST"), &Snapshot::new(200, "x")).unwrap_err();
        assert!(matches!(err, VordrError::StoreWrite(_)));
    }

    #[test]
    fn opaque_is_rejected() {
        let snapshot = Snapshot::new(0, "").with_kind(ResponseKind::Opaque);
        assert!(check_cacheable(&key("GET"), &snapshot).is_err());
    }

    #[test]
    fn partial_content_is_rejected() {
        assert!(check_cacheable(&key("GET"), &Snapshot::new(206, "x")).is_err());
    }

    #[test]
    fn vary_star_is_rejected() {
        let snapshot = Snapshot::new(200, "x").with_header("Vary", "Accept, *");
        assert!(check_cacheable(&key("GET"), &snapshot).is_err());
        let snapshot = Snapshot::new(200, "x").with_header("Vary", "Accept-Encoding");
        assert!(check_cacheable(&key("GET"), &snapshot).is_ok());
    }
}
