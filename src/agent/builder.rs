//! Builder for configuring agent instances

use std::sync::Arc;
use std::time::Duration;

use super::Agent;
use crate::Result;
use crate::config::{Config, StorageBackend};
use crate::lifecycle::{HostControl, StandaloneHost};
use crate::store::{CacheStorage, FsStorage, MemoryStorage};
use crate::transport::{HttpTransport, Transport};

/// Builder for configuring agent instances.
///
/// Anything not set explicitly is derived from the [`Config`] (or the
/// default config): the store backend from `[storage]`, an
/// [`HttpTransport`] with the `[network]` timeout, and a
/// [`StandaloneHost`].
#[derive(Default)]
pub struct AgentBuilder {
    config: Option<Config>,
    storage: Option<Arc<dyn CacheStorage>>,
    transport: Option<Arc<dyn Transport>>,
    host: Option<Arc<dyn HostControl>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration instead of the defaults.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a specific store registry.
    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use a specific network transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use the host runtime's takeover primitives.
    pub fn host(mut self, host: Arc<dyn HostControl>) -> Self {
        self.host = Some(host);
        self
    }

    /// Validate the configuration and build the agent.
    pub fn build(self) -> Result<Agent> {
        let config = self.config.unwrap_or_default();
        let scope = config.scope()?;

        let storage = match self.storage {
            Some(storage) => storage,
            None => match config.storage.backend {
                StorageBackend::Memory => Arc::new(MemoryStorage::with_max_entries(
                    config.storage.max_entries,
                )) as Arc<dyn CacheStorage>,
                StorageBackend::Fs => Arc::new(FsStorage::new(
                    config
                        .storage
                        .path
                        .clone()
                        .unwrap_or_else(FsStorage::default_root),
                )),
            },
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_timeout(
                scope.origin.clone(),
                Duration::from_secs(config.network.timeout_secs),
            )?),
        };

        let host = self.host.unwrap_or_else(|| Arc::new(StandaloneHost));

        Ok(Agent::new(scope, storage, transport, host))
    }
}
