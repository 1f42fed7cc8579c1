//! Strategy dispatcher.
//!
//! [`Dispatcher::handle`] classifies an intercepted request and runs the
//! strategy for its class:
//!
//! | Class | Strategy | Terminal miss |
//! |---|---|---|
//! | [`ExternalApi`](RequestClass::ExternalApi) | network-first, cache fallback | synthesized `[]` |
//! | [`Navigation`](RequestClass::Navigation) | cache-first, network fill | offline page, then index page |
//! | [`SameOriginAsset`](RequestClass::SameOriginAsset) | cache-first, network fill | offline chain for HTML, else 503 |
//! | [`Other`](RequestClass::Other) | network-first, any-store fallback | no response |
//!
//! For a single request the steps run strictly in order (lookup, maybe
//! fetch, maybe write, return). Concurrent requests for the same URL may
//! race to write the same entry; the last writer wins.
//!
//! Strategies never return errors. Every failure is absorbed by the next
//! fallback step, and the outcome of the last step is reported as a
//! [`FetchOutcome`].

mod cache_first;
mod network_first;

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::classify::{RequestClass, classify};
use crate::config::Scope;
use crate::store::CacheStorage;
use crate::telemetry;
use crate::transport::Transport;
use crate::types::{Request, RequestKey, Snapshot};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Offline or index page served in place of the requested document.
    Fallback,
    /// Built locally (empty JSON array, 503).
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

/// Result of handling one intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Answer the page with this response.
    Response {
        snapshot: Snapshot,
        source: ResponseSource,
    },
    /// The strategy ran out of options. The host's own default handling
    /// takes over (in a browser: a network error for the page).
    NoResponse,
    /// The request was not intercepted; the host performs it natively.
    PassThrough,
}

impl FetchOutcome {
    fn respond(snapshot: Snapshot, source: ResponseSource) -> Self {
        FetchOutcome::Response { snapshot, source }
    }

    /// The response, if any.
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            FetchOutcome::Response { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Response { source, .. } => Some(*source),
            _ => None,
        }
    }

    fn source_label(&self) -> &'static str {
        self.source().map(|s| s.as_str()).unwrap_or("none")
    }
}

/// Routes requests to per-class strategies.
pub struct Dispatcher {
    scope: Arc<Scope>,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        scope: Arc<Scope>,
        storage: Arc<dyn CacheStorage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            scope,
            storage,
            transport,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Classify and handle an intercepted request.
    #[instrument(
        skip_all,
        fields(
            url = %request.url(),
            method = request.method(),
            mode = ?request.request_mode(),
            transport = self.transport.name(),
        )
    )]
    pub async fn handle(&self, request: &Request) -> FetchOutcome {
        let class = classify(request, &self.scope);
        debug!(%class, "classified request");
        self.dispatch(class, request).await
    }

    /// Run the strategy for `class` regardless of what the classifier
    /// would pick.
    pub async fn dispatch(&self, class: RequestClass, request: &Request) -> FetchOutcome {
        let outcome = match class {
            RequestClass::Ignored => return FetchOutcome::PassThrough,
            RequestClass::ExternalApi => self.api(request).await,
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::SameOriginAsset => self.asset(request).await,
            RequestClass::Other => self.other(request).await,
        };
        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "class" => class.as_str(),
            "source" => outcome.source_label()
        )
        .increment(1);
        outcome
    }

    /// Exact-match lookup in one store. A missing store is a miss and is not
    /// created. Lookup failures count as misses.
    async fn lookup(&self, store_name: &str, key: &RequestKey) -> Option<Snapshot> {
        let hit = match self.storage.open_existing(store_name).await {
            Ok(Some(store)) => match store.match_request(key).await {
                Ok(hit) => hit,
                Err(e) => {
                    warn!(store = store_name, %key, error = %e, "store lookup failed");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(store = store_name, error = %e, "failed to open store");
                None
            }
        };
        let metric = if hit.is_some() {
            telemetry::CACHE_HITS_TOTAL
        } else {
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(metric, "store" => store_name.to_string()).increment(1);
        hit
    }

    /// Best-effort write of a duplicate. Failures are logged and absorbed.
    async fn store_copy(&self, store_name: &str, key: RequestKey, copy: Snapshot) {
        let result = match self.storage.open(store_name).await {
            Ok(store) => {
                debug!(store = store.name(), %key, "storing response copy");
                store.put(key.clone(), copy).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(store = store_name, %key, error = %e, "could not store response");
            metrics::counter!(
                telemetry::STORE_WRITE_FAILURES_TOTAL,
                "store" => store_name.to_string()
            )
            .increment(1);
        }
    }

    /// Offline page, then index page, from the asset store.
    async fn offline_fallback(&self) -> Option<Snapshot> {
        let store = &self.scope.asset_store;
        if let Some(page) = self
            .lookup(store, &RequestKey::get(&self.scope.offline_url))
            .await
        {
            return Some(page);
        }
        self.lookup(store, &RequestKey::get(&self.scope.index_url))
            .await
    }
}
