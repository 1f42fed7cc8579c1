//! In-memory store registry backed by moka.
//!
//! Stores never evict. Precached entries (the offline and index pages in
//! particular) must stay until their whole store is deleted, so the
//! per-store limit is enforced on write: once a store is full, writes of
//! new keys are rejected with [`VordrError::StoreWrite`] and existing
//! entries are left alone. Overwriting a key that is already present is
//! always allowed.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::{Mutex, RwLock};

use super::{Cache, CacheStorage, check_cacheable};
use crate::{Result, VordrError};
use crate::types::{RequestKey, Snapshot, StoredSnapshot};

/// Default maximum number of entries per store.
const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Process-local [`CacheStorage`].
///
/// Each store is an unbounded moka cache (no TTL, no size-based eviction)
/// guarded by a hard entry limit. Contents are lost when the process
/// exits; use [`FsStorage`](super::FsStorage) to persist.
pub struct MemoryStorage {
    stores: RwLock<BTreeMap<String, Arc<MemoryCache>>>,
    max_entries: u64,
}

impl MemoryStorage {
    /// Create an empty registry with the default per-store capacity (10,000).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create an empty registry with a custom per-store entry limit.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            stores: RwLock::new(BTreeMap::new()),
            max_entries: max,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>> {
        if let Some(store) = self.stores.read().await.get(name) {
            return Ok(store.clone());
        }
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCache::new(name, self.max_entries)))
            .clone();
        Ok(store)
    }

    async fn open_existing(&self, name: &str) -> Result<Option<Arc<dyn Cache>>> {
        Ok(self
            .stores
            .read()
            .await
            .get(name)
            .map(|store| store.clone() as Arc<dyn Cache>))
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn names(&self) -> Result<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.stores.write().await.remove(name);
        if let Some(store) = &removed {
            store.entries.invalidate_all();
        }
        Ok(removed.is_some())
    }
}

/// One in-memory store.
pub struct MemoryCache {
    name: String,
    entries: MokaCache<RequestKey, StoredSnapshot>,
    max_entries: u64,
    // Serializes the limit check with the insert.
    write_lock: Mutex<()>,
}

impl MemoryCache {
    fn new(name: &str, max_entries: u64) -> Self {
        Self {
            name: name.to_string(),
            entries: MokaCache::builder().build(),
            max_entries,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<Snapshot>> {
        if !key.is_get() {
            return Ok(None);
        }
        Ok(self
            .entries
            .get(key)
            .await
            .map(|stored| stored.to_snapshot()))
    }

    async fn put(&self, key: RequestKey, snapshot: Snapshot) -> Result<()> {
        check_cacheable(&key, &snapshot)?;

        let _guard = self.write_lock.lock().await;
        if !self.entries.contains_key(&key) {
            self.entries.run_pending_tasks().await;
            if self.entries.entry_count() >= self.max_entries {
                return Err(VordrError::StoreWrite(format!(
                    "{key}: store {} is full ({} entries)",
                    self.name, self.max_entries
                )));
            }
        }
        self.entries.insert(key, snapshot.into_stored()).await;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        let mut keys: Vec<RequestKey> = self.entries.iter().map(|(k, _)| (*k).clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        Ok(self.entries.remove(key).await.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse(&format!("https://app.example.org{path}")).unwrap())
    }

    #[tokio::test]
    async fn open_creates_and_lists() {
        let storage = MemoryStorage::new();
        assert!(!storage.has("assets-v1").await.unwrap());
        storage.open("assets-v1").await.unwrap();
        assert!(storage.has("assets-v1").await.unwrap());
        assert_eq!(storage.names().await.unwrap(), vec!["assets-v1"]);
    }

    #[tokio::test]
    async fn open_twice_returns_same_store() {
        let storage = MemoryStorage::new();
        let a = storage.open("s").await.unwrap();
        a.put(key("/x"), Snapshot::new(200, "x")).await.unwrap();
        let b = storage.open("s").await.unwrap();
        assert!(b.match_request(&key("/x")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_drops_contents() {
        let storage = MemoryStorage::new();
        let store = storage.open("s").await.unwrap();
        store.put(key("/x"), Snapshot::new(200, "x")).await.unwrap();

        assert!(storage.delete("s").await.unwrap());
        assert!(!storage.delete("s").await.unwrap());

        let reopened = storage.open("s").await.unwrap();
        assert!(reopened.match_request(&key("/x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_keeps_one_entry() {
        let storage = MemoryStorage::new();
        let store = storage.open("s").await.unwrap();
        store.put(key("/x"), Snapshot::new(200, "one")).await.unwrap();
        store.put(key("/x"), Snapshot::new(200, "two")).await.unwrap();

        assert_eq!(store.keys().await.unwrap().len(), 1);
        let hit = store.match_request(&key("/x")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "two");
    }

    #[tokio::test]
    async fn full_store_rejects_new_keys_and_keeps_old_ones() {
        let storage = MemoryStorage::with_max_entries(2);
        let store = storage.open("s").await.unwrap();
        store.put(key("/offline.html"), Snapshot::new(200, "offline")).await.unwrap();
        store.put(key("/index.html"), Snapshot::new(200, "index")).await.unwrap();

        for i in 0..20 {
            let err = store
                .put(key(&format!("/fill-{i}.js")), Snapshot::new(200, "x"))
                .await
                .unwrap_err();
            assert!(matches!(err, VordrError::StoreWrite(_)));
        }

        assert_eq!(store.keys().await.unwrap().len(), 2);
        let hit = store.match_request(&key("/offline.html")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "offline");
        assert!(store.match_request(&key("/index.html")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn full_store_still_accepts_overwrites() {
        let storage = MemoryStorage::with_max_entries(1);
        let store = storage.open("s").await.unwrap();
        store.put(key("/x"), Snapshot::new(200, "one")).await.unwrap();
        store.put(key("/x"), Snapshot::new(200, "two")).await.unwrap();

        let hit = store.match_request(&key("/x")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "two");
    }

    #[tokio::test]
    async fn delete_frees_a_slot() {
        let storage = MemoryStorage::with_max_entries(1);
        let store = storage.open("s").await.unwrap();
        store.put(key("/a"), Snapshot::new(200, "a")).await.unwrap();
        assert!(store.put(key("/b"), Snapshot::new(200, "b")).await.is_err());

        assert!(store.delete(&key("/a")).await.unwrap());
        store.put(key("/b"), Snapshot::new(200, "b")).await.unwrap();
        assert_eq!(store.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_existing_does_not_create() {
        let storage = MemoryStorage::new();
        assert!(storage.open_existing("s").await.unwrap().is_none());
        assert!(storage.names().await.unwrap().is_empty());

        storage.open("s").await.unwrap();
        let store = storage.open_existing("s").await.unwrap().unwrap();
        assert_eq!(store.name(), "s");
    }
}
