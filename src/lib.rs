//! Vordr - offline-first request interception for a single-origin web app
//!
//! This crate intercepts the outbound requests of one app's pages, picks a
//! caching strategy per request class, and keeps two versioned cache
//! stores (app assets and API data) so the app keeps working offline.
//!
//! The host environment is injected: a [`CacheStorage`](store::CacheStorage)
//! registry, a [`Transport`](transport::Transport) for the network, and a
//! [`HostControl`](lifecycle::HostControl) for the takeover primitives.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vordr::store::MemoryStorage;
//! use vordr::{Agent, Config, FetchOutcome, Request};
//!
//! #[tokio::main]
//! async fn main() -> vordr::Result<()> {
//!     let agent = Agent::builder()
//!         .config(Config::default())
//!         .storage(Arc::new(MemoryStorage::new()))
//!         .build()?;
//!
//!     agent.install().await?;
//!     agent.activate().await?;
//!
//!     let request = Request::navigate("https://app.example.org/")?;
//!     if let FetchOutcome::Response { snapshot, source } = agent.fetch(&request).await {
//!         println!("{} from {}", snapshot.status(), source.as_str());
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod strategy;
pub mod sync;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use agent::{Agent, AgentBuilder, Event, EventOutcome};
pub use classify::{RequestClass, classify};
pub use config::{Config, Scope};
pub use error::{Result, VordrError};
pub use lifecycle::{ActivateReport, HostControl, InstallReport, StandaloneHost};
pub use strategy::{FetchOutcome, ResponseSource};
pub use sync::SyncReport;

pub use types::{
    Request, RequestKey, RequestMode, ResponseKind, SERVICE_UNAVAILABLE_BODY, Snapshot,
    StoredSnapshot,
};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
