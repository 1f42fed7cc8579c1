//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::debug;

use super::Transport;
use crate::types::{Request, ResponseKind, Snapshot};
use crate::{Result, VordrError};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// [`Transport`] over HTTP(S).
///
/// Responses from `page_origin` are tagged [`ResponseKind::Basic`], every
/// other response [`ResponseKind::Cors`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    page_origin: String,
}

impl HttpTransport {
    /// Create a transport for pages served from `page_origin`.
    pub fn new(page_origin: impl Into<String>) -> Result<Self> {
        Self::with_timeout(page_origin, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(page_origin: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VordrError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(page_origin, http))
    }

    /// Use an existing client (shared connection pool).
    pub fn with_client(page_origin: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            page_origin: page_origin.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, request: &Request) -> Result<Snapshot> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| VordrError::InvalidRequest(format!("bad method: {e}")))?;

        let mut builder = self.http.request(method, request.url().clone());
        if let Some(accept) = request.accept_hint() {
            builder = builder.header(ACCEPT, accept);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let kind = if response.url().origin().ascii_serialization() == self.page_origin {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await?;
        debug!(url = %final_url, status, bytes = body.len(), "network response");

        let mut snapshot = Snapshot::new(status, body)
            .with_kind(kind)
            .with_url(final_url);
        for (name, value) in headers {
            snapshot = snapshot.with_header(name, value);
        }
        Ok(snapshot)
    }
}
