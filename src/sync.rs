//! Background refresh of the API store.
//!
//! [`refresh_api`] re-fetches every configured API endpoint and overwrites
//! its entry on success. Endpoints are refreshed concurrently and fail
//! independently: a failed endpoint keeps its previous entry and does not
//! stop the others. Nothing is ever propagated to the caller; the outcome
//! is reported in a [`SyncReport`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::Agent;
use crate::config::Scope;
use crate::store::{Cache, CacheStorage};
use crate::telemetry;
use crate::transport::Transport;
use crate::types::Request;
use crate::{Result, VordrError};

/// Per-endpoint outcome of a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Endpoints whose entry was overwritten.
    pub refreshed: Vec<Url>,
    /// Endpoints that failed, with the reason.
    pub failed: Vec<(Url, String)>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-fetch every API endpoint into the API store.
pub async fn refresh_api(
    scope: &Scope,
    storage: &dyn CacheStorage,
    transport: &dyn Transport,
) -> SyncReport {
    let store = match storage.open(&scope.api_store).await {
        Ok(store) => store,
        Err(e) => {
            warn!(store = %scope.api_store, error = %e, "cannot open API store for refresh");
            return SyncReport {
                refreshed: Vec::new(),
                failed: scope
                    .api_endpoints
                    .iter()
                    .map(|url| (url.clone(), e.to_string()))
                    .collect(),
            };
        }
    };

    let refreshes = scope.api_endpoints.iter().map(|url| {
        let store = store.clone();
        async move { (url.clone(), refresh_one(store.as_ref(), transport, url).await) }
    });

    let mut report = SyncReport::default();
    for (url, result) in join_all(refreshes).await {
        match result {
            Ok(()) => {
                debug!(%url, "refreshed");
                metrics::counter!(telemetry::SYNC_REFRESHES_TOTAL, "status" => "ok").increment(1);
                report.refreshed.push(url);
            }
            Err(e) => {
                warn!(%url, error = %e, "refresh failed; keeping previous entry");
                metrics::counter!(telemetry::SYNC_REFRESHES_TOTAL, "status" => "error")
                    .increment(1);
                report.failed.push((url, e.to_string()));
            }
        }
    }
    report
}

async fn refresh_one(store: &dyn Cache, transport: &dyn Transport, url: &Url) -> Result<()> {
    let request = Request::new("GET", url.clone());
    let snapshot = transport.fetch(&request).await?;
    if !snapshot.is_ok() {
        return Err(VordrError::Status {
            status: snapshot.status(),
            url: url.to_string(),
        });
    }
    store.put(request.key(), snapshot).await
}

/// Refresh the API store every `period` until `shutdown` turns `true`
/// or its sender is dropped.
///
/// The first refresh happens after one full period.
pub async fn run_periodic(agent: Arc<Agent>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = agent.refresh_api().await;
                info!(
                    refreshed = report.refreshed.len(),
                    failed = report.failed.len(),
                    "periodic API refresh"
                );
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("periodic refresh stopped");
                    return;
                }
            }
        }
    }
}
