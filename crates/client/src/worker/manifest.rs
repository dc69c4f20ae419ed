//! Deployment contract of one worker version.

use barstock_core::{AppConfig, Error};
use url::Url;

/// Everything a worker version needs to know about its deployment:
/// the cache version, the scope, what to precache and what to leave alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Version identifier; doubles as the name of the current store.
    pub cache_name: String,
    /// Scope of the worker. Requests outside its origin are not intercepted.
    pub base_url: Url,
    /// Precached on install, in order.
    pub core_assets: Vec<Url>,
    /// Hostname substrings that are never intercepted.
    pub bypass_hosts: Vec<String>,
    /// Application shell served when nothing better is available.
    pub offline_fallback: Url,
}

impl Manifest {
    /// Build the manifest from validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let invalid = |e: barstock_core::config::ConfigError| Error::InvalidUrl(e.to_string());

        let mut core_assets = config.core_asset_urls().map_err(invalid)?;
        let mut seen = std::collections::HashSet::new();
        core_assets.retain(|url| seen.insert(url.clone()));

        Ok(Self {
            cache_name: config.cache_name.clone(),
            base_url: config.base().map_err(invalid)?,
            core_assets,
            bypass_hosts: config.bypass_hosts.clone(),
            offline_fallback: config.offline_fallback_url().map_err(invalid)?,
        })
    }
}
