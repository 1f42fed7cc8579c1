//! Cache-first strategies: navigations and same-origin assets.
//!
//! A store hit is returned without touching the network. On a miss the
//! network answer is returned; ok answers are also written to the asset
//! store through a duplicate. Non-ok answers reach the caller unchanged
//! and are never stored.

use tracing::{debug, warn};

use super::{Dispatcher, FetchOutcome, ResponseSource};
use crate::types::{Request, Snapshot};

impl Dispatcher {
    /// Navigation: asset store, then network, then offline page, then
    /// index page.
    ///
    /// Only a network failure reaches the offline chain. A non-ok network
    /// answer (404, 500, ...) is returned to the caller as is.
    pub(super) async fn navigation(&self, request: &Request) -> FetchOutcome {
        match self.cache_then_network(request).await {
            Some(outcome) => outcome,
            None => match self.offline_fallback().await {
                Some(page) => FetchOutcome::respond(page, ResponseSource::Fallback),
                None => {
                    warn!(url = %request.url(), "offline with neither offline nor index page cached");
                    FetchOutcome::NoResponse
                }
            },
        }
    }

    /// Same-origin asset: asset store, then network. When both miss, an
    /// HTML request gets the offline chain and everything else a 503.
    pub(super) async fn asset(&self, request: &Request) -> FetchOutcome {
        match self.cache_then_network(request).await {
            Some(outcome) => outcome,
            None => {
                if request.accepts_html()
                    && let Some(page) = self.offline_fallback().await
                {
                    return FetchOutcome::respond(page, ResponseSource::Fallback);
                }
                FetchOutcome::respond(Snapshot::service_unavailable(), ResponseSource::Synthesized)
            }
        }
    }

    /// Shared cache-first prefix. `None` means store miss and network
    /// failure; the caller picks the fallback.
    async fn cache_then_network(&self, request: &Request) -> Option<FetchOutcome> {
        let key = request.key();
        let store = &self.scope.asset_store;

        if let Some(cached) = self.lookup(store, &key).await {
            return Some(FetchOutcome::respond(cached, ResponseSource::Cache));
        }

        match self.transport.fetch(request).await {
            Ok(snapshot) if snapshot.is_ok() => {
                let (response, copy) = snapshot.duplicate();
                self.store_copy(store, key, copy).await;
                Some(FetchOutcome::respond(response, ResponseSource::Network))
            }
            Ok(snapshot) => {
                debug!(%key, status = snapshot.status(), "non-ok response not stored");
                Some(FetchOutcome::respond(snapshot, ResponseSource::Network))
            }
            Err(e) => {
                debug!(%key, error = %e, "network failed after store miss");
                None
            }
        }
    }
}
