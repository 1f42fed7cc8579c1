//! Install and activate handling.
//!
//! - **Install** precaches both stores concurrently. The asset store is
//!   mandatory: any failure there fails the install with
//!   [`VordrError::InstallFailed`]. The API store is optional: failures
//!   are logged and the store fills lazily from real traffic. On success
//!   the host is asked to activate this instance without waiting for
//!   existing clients to close.
//! - **Activate** deletes every store whose name is not one of the two
//!   current version tokens, then asks the host to hand all open clients
//!   to this instance.
//!
//! Precaching a list is all-or-nothing: every URL is fetched first, and
//! entries are only written when all of them answered ok. Re-running a
//! precache overwrites the same keys.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Scope;
use crate::store::CacheStorage;
use crate::telemetry;
use crate::transport::Transport;
use crate::types::Request;
use crate::{Result, VordrError};

/// Takeover primitives offered by the host runtime.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Activate this instance immediately instead of waiting for clients
    /// of the previous one to close.
    async fn skip_waiting(&self);

    /// Take control of every open client.
    async fn claim_clients(&self);
}

/// Host with no other instances or clients to take over from.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneHost;

#[async_trait]
impl HostControl for StandaloneHost {
    async fn skip_waiting(&self) {
        debug!("skip_waiting: nothing to replace");
    }

    async fn claim_clients(&self) {
        debug!("claim_clients: no clients attached");
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Entries written to the asset store.
    pub assets_cached: usize,
    /// Entries written to the API store, `None` if that precache failed.
    pub api_cached: Option<usize>,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Stale stores that were deleted.
    pub deleted: Vec<String>,
    /// Stores left in place (the current ones).
    pub retained: Vec<String>,
}

/// Provisions and reconciles the two stores.
pub struct Lifecycle {
    scope: Arc<Scope>,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    host: Arc<dyn HostControl>,
}

impl Lifecycle {
    pub fn new(
        scope: Arc<Scope>,
        storage: Arc<dyn CacheStorage>,
        transport: Arc<dyn Transport>,
        host: Arc<dyn HostControl>,
    ) -> Self {
        Self {
            scope,
            storage,
            transport,
            host,
        }
    }

    /// Precache both stores, then ask the host to skip waiting.
    #[instrument(
        skip(self),
        fields(
            assets = %self.scope.asset_store,
            api = %self.scope.api_store,
            transport = self.transport.name(),
        )
    )]
    pub async fn install(&self) -> Result<InstallReport> {
        let (assets, api) = tokio::join!(
            self.precache(&self.scope.asset_store, &self.scope.precache_assets),
            self.precache(&self.scope.api_store, &self.scope.api_endpoints),
        );

        let assets_cached = assets.map_err(|e| VordrError::InstallFailed {
            reason: e.to_string(),
        })?;

        let api_cached = match api {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "API precache failed; data will be cached on first use");
                None
            }
        };

        self.host.skip_waiting().await;
        info!(assets_cached, ?api_cached, "install complete");
        Ok(InstallReport {
            assets_cached,
            api_cached,
        })
    }

    /// Delete every stale store, then ask the host to claim clients.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<ActivateReport> {
        let (retained, stale): (Vec<String>, Vec<String>) = self
            .storage
            .names()
            .await?
            .into_iter()
            .partition(|name| self.scope.is_current_store(name));

        let deletions = stale.iter().map(|name| async move {
            let existed = self.storage.delete(name).await?;
            if existed {
                info!(store = %name, "deleted stale store");
            }
            Ok::<_, VordrError>(name.clone())
        });
        let deleted = try_join_all(deletions).await?;
        metrics::counter!(telemetry::STORES_DELETED_TOTAL).increment(deleted.len() as u64);

        self.host.claim_clients().await;
        Ok(ActivateReport { deleted, retained })
    }

    /// Fetch every URL and, only if all answered ok, write them all to
    /// `store_name`. Returns the number of entries written.
    pub async fn precache(&self, store_name: &str, urls: &[Url]) -> Result<usize> {
        let store = self.storage.open(store_name).await?;

        let fetches = urls.iter().map(|url| async move {
            let request = Request::new("GET", url.clone());
            let snapshot = self.transport.fetch(&request).await?;
            if !snapshot.is_ok() {
                return Err(VordrError::Status {
                    status: snapshot.status(),
                    url: url.to_string(),
                });
            }
            Ok((request.key(), snapshot))
        });
        let responses = try_join_all(fetches).await?;

        let count = responses.len();
        for (key, snapshot) in responses {
            store.put(key, snapshot).await?;
        }
        debug!(store = store.name(), count, "precached");
        Ok(count)
    }
}
