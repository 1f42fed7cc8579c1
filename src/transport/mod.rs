//! Network transport abstraction.
//!
//! A [`Transport`] performs one outbound request and returns a
//! [`Snapshot`], or an error when the network is unreachable. A non-ok
//! status is still a successful fetch; strategies decide what to do with it.

pub mod http;

use async_trait::async_trait;

use crate::Result;
use crate::types::{Request, Snapshot};

pub use http::HttpTransport;

/// Outbound network access.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging/debugging.
    fn name(&self) -> &str;

    /// Perform `request`.
    ///
    /// Returns [`VordrError::Transport`](crate::VordrError::Transport) on
    /// total failure (DNS, connect, timeout, reset).
    async fn fetch(&self, request: &Request) -> Result<Snapshot>;
}
