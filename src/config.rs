//! Static configuration.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. explicit path (`--config <path>`)
//! 2. `~/.vordr/config.toml` (user)
//! 3. `/etc/vordr/config.toml` (system)
//!
//! When no file exists the built-in defaults are used. Every field has a
//! default, so a file only needs the values it changes.
//!
//! [`Config`] is the file form. [`Config::scope`] validates it and
//! resolves every URL against the origin, producing the [`Scope`] the
//! lifecycle manager and dispatcher read at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::{Result, VordrError};

/// Agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Origin the app pages are served from.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Hostname of the external JSON API.
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Page served to navigations while offline (relative to `origin`).
    #[serde(default = "default_offline_url")]
    pub offline_url: String,
    /// Last-resort page for navigations (relative to `origin`).
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Background sync tag that triggers an API refresh.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub precache: PrecacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_host: default_api_host(),
            offline_url: default_offline_url(),
            index_url: default_index_url(),
            sync_tag: default_sync_tag(),
            stores: StoresConfig::default(),
            precache: PrecacheConfig::default(),
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

fn default_origin() -> String {
    "https://app.example.org".to_string()
}

fn default_api_host() -> String {
    "api.example.org".to_string()
}

fn default_offline_url() -> String {
    "/offline.html".to_string()
}

fn default_index_url() -> String {
    "/index.html".to_string()
}

fn default_sync_tag() -> String {
    "refresh-api".to_string()
}

/// Version tokens naming the two stores.
#[derive(Debug, Clone, Deserialize)]
pub struct StoresConfig {
    /// App asset store token (default: `app-shell-v5`).
    #[serde(default = "default_asset_store")]
    pub assets: String,
    /// API store token (default: `api-data-v3`).
    #[serde(default = "default_api_store")]
    pub api: String,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            assets: default_asset_store(),
            api: default_api_store(),
        }
    }
}

fn default_asset_store() -> String {
    "app-shell-v5".to_string()
}

fn default_api_store() -> String {
    "api-data-v3".to_string()
}

/// URL lists precached at install.
#[derive(Debug, Clone, Deserialize)]
pub struct PrecacheConfig {
    /// Asset URLs, relative to `origin`. Mandatory at install.
    #[serde(default = "default_precache_assets")]
    pub assets: Vec<String>,
    /// Absolute API endpoint URLs. Optional at install, refreshed by sync.
    #[serde(default = "default_precache_api")]
    pub api: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            assets: default_precache_assets(),
            api: default_precache_api(),
        }
    }
}

fn default_precache_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/styles.css",
        "/app.js",
        "/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_precache_api() -> Vec<String> {
    vec!["https://api.example.org/v1/items".to_string()]
}

/// Which [`CacheStorage`](crate::store::CacheStorage) backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Fs,
}

/// Store backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the `fs` backend (default: `~/.cache/vordr/stores`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Per-store entry limit for the `memory` backend (default: 10,000).
    /// Writes of new keys into a full store are rejected; nothing is evicted.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

/// Network transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist; the user and system locations are
    /// optional and fall back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    VordrError::Configuration(format!("Failed to read config file {path:?}: {e}"))
                })?;
                Self::from_toml_str(&content).map_err(|e| {
                    VordrError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VordrError::Configuration(e.to_string()))
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(VordrError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vordr").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/vordr/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Check the configuration for values the agent cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.scope().map(|_| ())
    }

    /// Validate and resolve into a [`Scope`].
    pub fn scope(&self) -> Result<Scope> {
        let assets = self.stores.assets.trim();
        let api = self.stores.api.trim();
        if assets.is_empty() || api.is_empty() {
            return Err(VordrError::Configuration(
                "store tokens must not be empty".to_string(),
            ));
        }
        if assets == api {
            return Err(VordrError::Configuration(format!(
                "asset and API stores must use different tokens (both are {assets:?})"
            )));
        }

        let origin_url = Url::parse(&self.origin).map_err(|e| {
            VordrError::Configuration(format!("invalid origin {:?}: {e}", self.origin))
        })?;
        if !origin_url.origin().is_tuple() {
            return Err(VordrError::Configuration(format!(
                "origin {:?} has no host",
                self.origin
            )));
        }

        let api_host = self.api_host.trim().to_ascii_lowercase();
        if api_host.is_empty() {
            return Err(VordrError::Configuration(
                "api_host must not be empty".to_string(),
            ));
        }

        let offline_url = resolve_relative(&origin_url, "offline_url", &self.offline_url)?;
        let index_url = resolve_relative(&origin_url, "index_url", &self.index_url)?;

        let precache_assets = self
            .precache
            .assets
            .iter()
            .map(|path| resolve_relative(&origin_url, "precache.assets", path))
            .collect::<Result<Vec<_>>>()?;

        let api_endpoints = self
            .precache
            .api
            .iter()
            .map(|endpoint| {
                Url::parse(endpoint).map_err(|e| {
                    VordrError::Configuration(format!(
                        "precache.api entry {endpoint:?} must be an absolute URL: {e}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Scope {
            origin: origin_url.origin().ascii_serialization(),
            api_host,
            asset_store: assets.to_string(),
            api_store: api.to_string(),
            precache_assets,
            api_endpoints,
            offline_url,
            index_url,
            sync_tag: self.sync_tag.clone(),
        })
    }
}

fn resolve_relative(origin: &Url, field: &str, path: &str) -> Result<Url> {
    if Url::parse(path).is_ok() {
        return Err(VordrError::Configuration(format!(
            "{field} entry {path:?} must be relative to the origin"
        )));
    }
    origin
        .join(path)
        .map_err(|e| VordrError::Configuration(format!("{field} entry {path:?}: {e}")))
}

/// Resolved, read-only configuration shared by every component.
#[derive(Debug, Clone)]
pub struct Scope {
    /// ASCII serialization of the page origin.
    pub origin: String,
    /// Lower-cased external API hostname.
    pub api_host: String,
    /// Current asset store token.
    pub asset_store: String,
    /// Current API store token.
    pub api_store: String,
    pub precache_assets: Vec<Url>,
    pub api_endpoints: Vec<Url>,
    pub offline_url: Url,
    pub index_url: Url,
    pub sync_tag: String,
}

impl Scope {
    /// Whether `name` is one of the two current store tokens.
    pub fn is_current_store(&self, name: &str) -> bool {
        name == self.asset_store || name == self.api_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let scope = Config::default().scope().unwrap();
        assert_eq!(scope.origin, "https://app.example.org");
        assert_eq!(scope.asset_store, "app-shell-v5");
        assert_eq!(scope.api_store, "api-data-v3");
        assert_eq!(
            scope.offline_url.as_str(),
            "https://app.example.org/offline.html"
        );
        assert_eq!(scope.precache_assets.len(), 6);
        assert_eq!(scope.precache_assets[0].as_str(), "https://app.example.org/");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            origin = "http://localhost:8080"

            [stores]
            assets = "shell-v9"
            "#,
        )
        .unwrap();
        assert_eq!(config.stores.assets, "shell-v9");
        assert_eq!(config.stores.api, "api-data-v3");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.network.timeout_secs, 30);

        let scope = config.scope().unwrap();
        assert_eq!(scope.origin, "http://localhost:8080");
        assert_eq!(
            scope.index_url.as_str(),
            "http://localhost:8080/index.html"
        );
    }

    #[test]
    fn storage_backend_parses() {
        let config = Config::from_toml_str(
            r#"
            [storage]
            backend = "fs"
            path = "/tmp/vordr"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/vordr")));
    }

    #[test]
    fn equal_tokens_rejected() {
        let mut config = Config::default();
        config.stores.api = config.stores.assets.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("different tokens"));
    }

    #[test]
    fn empty_token_rejected() {
        let mut config = Config::default();
        config.stores.assets = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn absolute_offline_url_rejected() {
        let mut config = Config::default();
        config.offline_url = "https://elsewhere.example/offline.html".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_api_endpoint_rejected() {
        let mut config = Config::default();
        config.precache.api = vec!["/v1/items".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(VordrError::Configuration(_))));
    }

    #[test]
    fn is_current_store() {
        let scope = Config::default().scope().unwrap();
        assert!(scope.is_current_store("app-shell-v5"));
        assert!(scope.is_current_store("api-data-v3"));
        assert!(!scope.is_current_store("app-shell-v4"));
    }
}
