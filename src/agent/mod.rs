//! The interception agent.
//!
//! [`Agent`] wires the static [`Scope`], a store registry, a transport and
//! the host's takeover primitives into the lifecycle manager and the
//! strategy dispatcher, and exposes one entry point per host event.
//!
//! # Event handles
//!
//! Hosts that deliver events asynchronously use [`Agent::spawn`]: it runs
//! the event on its own task and returns the task handle. The event is not
//! complete until that handle resolves; a host must not tear the agent down
//! or report the event as handled before then.

mod builder;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

pub use builder::AgentBuilder;

use crate::Result;
use crate::config::Scope;
use crate::lifecycle::{ActivateReport, HostControl, InstallReport, Lifecycle};
use crate::store::CacheStorage;
use crate::strategy::{Dispatcher, FetchOutcome};
use crate::sync::{self, SyncReport};
use crate::transport::Transport;
use crate::types::Request;

/// An event delivered by the host runtime.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    /// Background sync with the given tag.
    Sync(String),
}

/// What handling an [`Event`] produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(Result<InstallReport>),
    Activated(Result<ActivateReport>),
    Fetched(FetchOutcome),
    /// `None` when the sync tag is not ours.
    Synced(Option<SyncReport>),
}

/// Offline caching agent for one origin and one API host.
pub struct Agent {
    scope: Arc<Scope>,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    lifecycle: Lifecycle,
    dispatcher: Dispatcher,
}

impl Agent {
    /// Create a new builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub(crate) fn new(
        scope: Scope,
        storage: Arc<dyn CacheStorage>,
        transport: Arc<dyn Transport>,
        host: Arc<dyn HostControl>,
    ) -> Self {
        let scope = Arc::new(scope);
        Self {
            lifecycle: Lifecycle::new(
                scope.clone(),
                storage.clone(),
                transport.clone(),
                host,
            ),
            dispatcher: Dispatcher::new(scope.clone(), storage.clone(), transport.clone()),
            scope,
            storage,
            transport,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Precache both stores. See [`Lifecycle::install`].
    pub async fn install(&self) -> Result<InstallReport> {
        self.lifecycle.install().await
    }

    /// Purge stale stores. See [`Lifecycle::activate`].
    pub async fn activate(&self) -> Result<ActivateReport> {
        self.lifecycle.activate().await
    }

    /// Handle an intercepted request. See [`Dispatcher::handle`].
    pub async fn fetch(&self, request: &Request) -> FetchOutcome {
        self.dispatcher.handle(request).await
    }

    /// Handle a background sync. Tags other than the configured one are
    /// ignored.
    pub async fn sync(&self, tag: &str) -> Option<SyncReport> {
        if tag != self.scope.sync_tag {
            debug!(tag, "ignoring foreign sync tag");
            return None;
        }
        Some(self.refresh_api().await)
    }

    /// Re-fetch every API endpoint into the API store.
    pub async fn refresh_api(&self) -> SyncReport {
        sync::refresh_api(&self.scope, self.storage.as_ref(), self.transport.as_ref()).await
    }

    /// Handle one event to completion.
    pub async fn handle(&self, event: Event) -> EventOutcome {
        match event {
            Event::Install => EventOutcome::Installed(self.install().await),
            Event::Activate => EventOutcome::Activated(self.activate().await),
            Event::Fetch(request) => EventOutcome::Fetched(self.fetch(&request).await),
            Event::Sync(tag) => EventOutcome::Synced(self.sync(&tag).await),
        }
    }

    /// Handle `event` on its own task and return the completion handle.
    pub fn spawn(self: &Arc<Self>, event: Event) -> JoinHandle<EventOutcome> {
        let agent = Arc::clone(self);
        tokio::spawn(async move { agent.handle(event).await })
    }
}
