//! On-disk store registry.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<hex(store name)>/<sha256(request key)>.json
//! ```
//!
//! Each entry file holds the request key and the stored response (body
//! base64 encoded). Writes go to a unique tmp file first and are renamed
//! into place, so a concurrent reader never sees a torn entry and racing
//! writers for the same key resolve as last-writer-wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::{Cache, CacheStorage, check_cacheable};
use crate::types::{RequestKey, Snapshot, StoredSnapshot};
use crate::{Result, VordrError};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistent [`CacheStorage`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Use `root` as the registry directory. It is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root: `~/.cache/vordr/stores`.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("vordr")
            .join("stores")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }
}

#[async_trait]
impl CacheStorage for FsStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>> {
        let dir = self.store_dir(name);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            VordrError::Store(format!("failed to create store dir {}: {e}", dir.display()))
        })?;
        Ok(Arc::new(FsCache {
            name: name.to_string(),
            dir,
        }))
    }

    async fn has(&self, name: &str) -> Result<bool> {
        match tokio::fs::metadata(self.store_dir(name)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VordrError::Store(format!("failed to stat store {name}: {e}"))),
        }
    }

    async fn names(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(VordrError::Store(format!(
                    "failed to list {}: {e}",
                    self.root.display()
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VordrError::Store(e.to_string()))?
        {
            let file_name = entry.file_name();
            let Some(encoded) = file_name.to_str() else {
                continue;
            };
            match hex::decode(encoded).ok().and_then(|b| String::from_utf8(b).ok()) {
                Some(name) => names.push(name),
                None => warn!(path = %entry.path().display(), "ignoring foreign entry in store root"),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match tokio::fs::remove_dir_all(self.store_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VordrError::Store(format!(
                "failed to delete store {name}: {e}"
            ))),
        }
    }
}

/// On-disk entry format.
#[derive(Serialize, Deserialize)]
struct FsEntry {
    key: RequestKey,
    response: StoredSnapshot,
}

/// One on-disk store.
pub struct FsCache {
    name: String,
    dir: PathBuf,
}

impl FsCache {
    fn entry_path(&self, key: &RequestKey) -> PathBuf {
        let digest = Sha256::digest(key.to_string().as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read_entry(path: &Path) -> Result<Option<FsEntry>> {
        let content = match tokio::fs::read(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VordrError::Store(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        match serde_json::from_slice(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt store entry");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Cache for FsCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<Snapshot>> {
        if !key.is_get() {
            return Ok(None);
        }
        Ok(Self::read_entry(&self.entry_path(key))
            .await?
            .filter(|entry| &entry.key == key)
            .map(|entry| entry.response.to_snapshot()))
    }

    async fn put(&self, key: RequestKey, snapshot: Snapshot) -> Result<()> {
        check_cacheable(&key, &snapshot)?;

        let path = self.entry_path(&key);
        let entry = FsEntry {
            key,
            response: snapshot.into_stored(),
        };
        let json = serde_json::to_vec(&entry)?;

        // Write to a unique tmp file first, then rename for atomicity
        let tmp_path = path.with_extension(format!(
            "{}.tmp",
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp_path, &json).await.map_err(|e| {
            VordrError::StoreWrite(format!("failed to write {}: {e}", tmp_path.display()))
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            VordrError::StoreWrite(format!(
                "failed to rename {} → {}: {e}",
                tmp_path.display(),
                path.display()
            ))
        })?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VordrError::Store(e.to_string())),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VordrError::Store(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(entry) = Self::read_entry(&path).await? {
                keys.push(entry.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VordrError::Store(e.to_string())),
        }
    }
}
