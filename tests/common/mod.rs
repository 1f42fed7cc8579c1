//! Shared mocks for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vordr::store::{Cache, CacheStorage, MemoryStorage};
use vordr::transport::Transport;
use vordr::{
    Agent, Config, HostControl, Request, RequestKey, Result, Scope, Snapshot, VordrError,
};

pub const ORIGIN: &str = "https://app.example.org";
pub const API_ITEMS: &str = "https://api.example.org/v1/items";
pub const API_USERS: &str = "https://api.example.org/v1/users";

#[derive(Clone)]
enum Route {
    Respond {
        status: u16,
        body: String,
        headers: Vec<(String, String)>,
    },
    Fail,
}

/// Transport answering from a routing table. Unknown URLs fail as if the
/// network were down.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    total: AtomicU32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.respond_with_headers(url, status, body, &[])
    }

    pub fn respond_with_headers(
        &self,
        url: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) -> &Self {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Respond {
                status,
                body: body.to_string(),
                headers: headers
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
            },
        );
        self
    }

    pub fn fail(&self, url: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail);
        self
    }

    /// Take every route offline.
    pub fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }

    pub fn calls(&self) -> u32 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &Request) -> Result<Snapshot> {
        let url = request.url().to_string();
        self.total.fetch_add(1, Ordering::Relaxed);
        self.calls.lock().unwrap().push(url.clone());

        let route = self.routes.lock().unwrap().get(&url).cloned();
        match route {
            Some(Route::Respond {
                status,
                body,
                headers,
            }) => {
                let mut snapshot = Snapshot::new(status, body).with_url(url);
                for (name, value) in headers {
                    snapshot = snapshot.with_header(name, value);
                }
                Ok(snapshot)
            }
            Some(Route::Fail) | None => Err(VordrError::Transport(format!(
                "connection refused: {url}"
            ))),
        }
    }
}

/// Host that counts takeover calls.
#[derive(Default)]
pub struct CountingHost {
    pub skip_waiting: AtomicU32,
    pub claim_clients: AtomicU32,
}

impl CountingHost {
    pub fn skip_waiting_calls(&self) -> u32 {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    pub fn claim_calls(&self) -> u32 {
        self.claim_clients.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HostControl for CountingHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::Relaxed);
    }

    async fn claim_clients(&self) {
        self.claim_clients.fetch_add(1, Ordering::Relaxed);
    }
}

/// Small config: three assets, two API endpoints.
pub fn test_config() -> Config {
    Config::from_toml_str(&format!(
        r#"
        origin = "{ORIGIN}"
        api_host = "api.example.org"
        offline_url = "/offline.html"
        index_url = "/index.html"

        [stores]
        assets = "asset_v5"
        api = "api_v3"

        [precache]
        assets = ["/index.html", "/offline.html", "/app.js"]
        api = ["{API_ITEMS}", "{API_USERS}"]
        "#
    ))
    .unwrap()
}

pub fn test_scope() -> Scope {
    test_config().scope().unwrap()
}

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn key(url: &str) -> RequestKey {
    RequestKey::get(&url.parse().unwrap())
}

pub struct Harness {
    pub agent: Arc<Agent>,
    pub storage: Arc<MemoryStorage>,
    pub transport: Arc<MockTransport>,
    pub host: Arc<CountingHost>,
}

pub fn harness() -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let transport = Arc::new(MockTransport::new());
    let host = Arc::new(CountingHost::default());
    let agent = Agent::builder()
        .config(test_config())
        .storage(storage.clone())
        .transport(transport.clone())
        .host(host.clone())
        .build()
        .unwrap();
    Harness {
        agent: Arc::new(agent),
        storage,
        transport,
        host,
    }
}

/// Put `body` directly into `store` for `url`.
pub async fn seed(storage: &dyn CacheStorage, store: &str, url: &str, body: &str) {
    storage
        .open(store)
        .await
        .unwrap()
        .put(key(url), Snapshot::new(200, body.to_string()))
        .await
        .unwrap();
}

/// Body of the entry for `url` in `store`, if any.
pub async fn stored_body(storage: &dyn CacheStorage, store: &str, url: &str) -> Option<String> {
    storage
        .open(store)
        .await
        .unwrap()
        .match_request(&key(url))
        .await
        .unwrap()
        .map(|s| s.text())
}

pub async fn open(storage: &dyn CacheStorage, store: &str) -> Arc<dyn Cache> {
    storage.open(store).await.unwrap()
}
