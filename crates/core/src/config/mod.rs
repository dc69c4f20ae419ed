//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (BARSTOCK_SW_*)
//! 2. TOML config file (if BARSTOCK_SW_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The defaults are the deployment contract of the BarStock web build: the
//! cache version, the precached shell assets, and the hosts that must never
//! be cached.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Current cache version. Bump on every deployment that changes assets.
pub const DEFAULT_CACHE_NAME: &str = "smartbar-pwa-v1";

/// Application shell assets, relative to the base URL.
pub const DEFAULT_CORE_ASSETS: &[&str] = &[
    "index.html",
    "manifest.json",
    "favicon.png",
    "icons/Icon-192.png",
    "icons/Icon-512.png",
    "icons/Icon-maskable-192.png",
    "icons/Icon-maskable-512.png",
    "flutter_bootstrap.js",
    "main.dart.js",
    "assets/AssetManifest.json",
    "assets/FontManifest.json",
    "assets/NOTICES",
];

/// Backend hosts (realtime database, APIs, fonts, functions) that are never cached.
pub const DEFAULT_BYPASS_HOSTS: &[&str] = &["firebaseio.com", "googleapis.com", "gstatic.com", "cloudfunctions.net"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (BARSTOCK_SW_*)
/// 2. TOML config file (if BARSTOCK_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via BARSTOCK_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Deployment base URL (the worker scope). Must end with `/`.
    ///
    /// Set via BARSTOCK_SW_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Cache version identifier; stores with any other name are pruned on activation.
    ///
    /// Set via BARSTOCK_SW_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Assets precached on install, relative to `base_url`.
    ///
    /// Set via BARSTOCK_SW_CORE_ASSETS environment variable (array syntax, e.g. `[a, b]`).
    #[serde(default = "default_core_assets")]
    pub core_assets: Vec<String>,

    /// Hostname substrings that are never intercepted.
    ///
    /// Set via BARSTOCK_SW_BYPASS_HOSTS environment variable (array syntax).
    #[serde(default = "default_bypass_hosts")]
    pub bypass_hosts: Vec<String>,

    /// Application shell served when the network is unavailable.
    ///
    /// Set via BARSTOCK_SW_OFFLINE_FALLBACK environment variable.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via BARSTOCK_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via BARSTOCK_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via BARSTOCK_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./barstock-sw-cache.sqlite")
}

fn default_base_url() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.into()
}

fn default_core_assets() -> Vec<String> {
    DEFAULT_CORE_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_bypass_hosts() -> Vec<String> {
    DEFAULT_BYPASS_HOSTS.iter().map(|s| s.to_string()).collect()
}

fn default_offline_fallback() -> String {
    "index.html".into()
}

fn default_user_agent() -> String {
    "barstock-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            base_url: default_base_url(),
            cache_name: default_cache_name(),
            core_assets: default_core_assets(),
            bypass_hosts: default_bypass_hosts(),
            offline_fallback: default_offline_fallback(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `base_url` is not an absolute URL.
    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid { field: "base_url".into(), reason: e.to_string() })
    }

    /// Resolve a path relative to the base URL, dropping any fragment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the base or the joined URL is malformed.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let mut url = self
            .base()?
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "core_assets".into(), reason: format!("{path}: {e}") })?;
        url.set_fragment(None);
        Ok(url)
    }

    /// Core asset list resolved against the base URL, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for the first asset that cannot be resolved.
    pub fn core_asset_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.core_assets.iter().map(|path| self.resolve(path)).collect()
    }

    /// Offline fallback entry resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the entry cannot be resolved.
    pub fn offline_fallback_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_fallback)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `BARSTOCK_SW_`
    /// 2. TOML file from `BARSTOCK_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("BARSTOCK_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(
            Env::prefixed("BARSTOCK_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        ))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./barstock-sw-cache.sqlite"));
        assert_eq!(config.cache_name, "smartbar-pwa-v1");
        assert_eq!(config.core_assets.len(), 12);
        assert_eq!(config.bypass_hosts.len(), 4);
        assert_eq!(config.offline_fallback, "index.html");
        assert_eq!(config.user_agent, "barstock-sw/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_core_assets_resolved_against_base() {
        let config = AppConfig { base_url: "https://barstock.example/app/".into(), ..Default::default() };
        let urls = config.core_asset_urls().unwrap();
        assert_eq!(urls[0].as_str(), "https://barstock.example/app/index.html");
        assert_eq!(urls[3].as_str(), "https://barstock.example/app/icons/Icon-192.png");
        assert_eq!(urls[11].as_str(), "https://barstock.example/app/assets/NOTICES");
    }

    #[test]
    fn test_offline_fallback_url() {
        let config = AppConfig::default();
        assert_eq!(config.offline_fallback_url().unwrap().as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_resolve_drops_fragment() {
        let config = AppConfig::default();
        let url = config.resolve("index.html#/inventory").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_name = "smartbar-pwa-v2"
            base_url = "https://bar.example/"
            bypass_hosts = ["firebaseio.com"]
            "#,
        ));
        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.cache_name, "smartbar-pwa-v2");
        assert_eq!(config.base_url, "https://bar.example/");
        assert_eq!(config.bypass_hosts, vec!["firebaseio.com".to_string()]);
        assert_eq!(config.core_assets.len(), 12);
    }

    #[test]
    fn test_invalid_layer_rejected() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(r#"cache_name = """#));
        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_name"));
    }
}
