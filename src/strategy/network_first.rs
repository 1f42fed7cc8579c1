//! Network-first strategies: the external API and third-party resources.

use tracing::debug;

use super::{Dispatcher, FetchOutcome, ResponseSource};
use crate::types::{Request, Snapshot};

impl Dispatcher {
    /// External API: network, then API store, then an empty JSON array.
    ///
    /// Never ends without a response.
    pub(super) async fn api(&self, request: &Request) -> FetchOutcome {
        let key = request.key();
        let store = &self.scope.api_store;

        match self.transport.fetch(request).await {
            Ok(snapshot) if snapshot.is_ok() => {
                let (response, copy) = snapshot.duplicate();
                self.store_copy(store, key, copy).await;
                return FetchOutcome::respond(response, ResponseSource::Network);
            }
            Ok(snapshot) => {
                debug!(%key, status = snapshot.status(), "API answered non-ok, trying store");
            }
            Err(e) => {
                debug!(%key, error = %e, "API unreachable, trying store");
            }
        }

        if let Some(cached) = self.lookup(store, &key).await {
            return FetchOutcome::respond(cached, ResponseSource::Cache);
        }

        debug!(%key, "no cached API data, serving empty array");
        FetchOutcome::respond(Snapshot::empty_json_array(), ResponseSource::Synthesized)
    }

    /// Third-party resources: network, then any store. Nothing is written.
    ///
    /// Any network answer is returned as-is, whatever its status. When the
    /// network fails and no store holds the request, the outcome is
    /// [`FetchOutcome::NoResponse`].
    pub(super) async fn other(&self, request: &Request) -> FetchOutcome {
        let key = request.key();
        match self.transport.fetch(request).await {
            Ok(snapshot) => FetchOutcome::respond(snapshot, ResponseSource::Network),
            Err(e) => {
                debug!(%key, error = %e, "network failed, searching all stores");
                match self.storage.match_any(&key).await {
                    Ok(Some(cached)) => FetchOutcome::respond(cached, ResponseSource::Cache),
                    Ok(None) => FetchOutcome::NoResponse,
                    Err(e) => {
                        debug!(%key, error = %e, "store search failed");
                        FetchOutcome::NoResponse
                    }
                }
            }
        }
    }
}
