//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an http(s) URL ending in `/`
    /// - `cache_name`, `offline_fallback` or `user_agent` is empty
    /// - a core asset or bypass host entry is empty or unresolvable
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid { field: "base_url".into(), reason: "must be http or https".into() });
        }
        if !base.path().ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "base_url".into(),
                reason: "must end with '/' so relative assets resolve inside the scope".into(),
            });
        }

        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }

        if self.offline_fallback.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "offline_fallback".into(), reason: "must not be empty".into() });
        }
        self.offline_fallback_url()?;

        if self.core_assets.iter().any(|asset| asset.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "core_assets".into(),
                reason: "entries must not be empty".into(),
            });
        }
        let urls = self.core_asset_urls()?;
        let unique: HashSet<&str> = urls.iter().map(|u| u.as_str()).collect();
        if unique.len() != urls.len() {
            tracing::warn!(
                assets = urls.len(),
                unique = unique.len(),
                "core_assets contains duplicates; each is precached once"
            );
        }

        if self.bypass_hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "bypass_hosts".into(),
                reason: "entries must not be empty (an empty entry matches every host)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        Ok(())
    }
}
