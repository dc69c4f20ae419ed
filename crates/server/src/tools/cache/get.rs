//! cache_get tool implementation.
//!
//! Retrieves the entry stored for a URL in the current store.

use barstock_client::{Manifest, fetch::canonicalize};
use barstock_core::{CacheDb, Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{ResponseOutput, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the deployment base URL.
    pub url: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, manifest: &Manifest, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, Some(&manifest.base_url))
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", params.url, e)))?;

    let response = cache
        .match_entry(&manifest.cache_name, &Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    json_result(&ResponseOutput::new(response, "cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{manager, parse};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let (worker, db, _network) = manager().await;
        let params = CacheGetParams { url: "main.dart.js".to_string() };

        let err = get_impl(&db, worker.manifest(), params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let (worker, db, _network) = manager().await;
        worker.install().await.unwrap();

        let params = CacheGetParams { url: "https://bar.example/main.dart.js".to_string() };
        let output: ResponseOutput = parse(&get_impl(&db, worker.manifest(), params).await.unwrap());
        assert_eq!(output.source, "cache");
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "main()");
    }
}
