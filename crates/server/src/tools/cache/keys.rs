//! cache_keys tool implementation.

use barstock_core::CacheDb;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Store names, oldest first.
    pub caches: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb) -> Result<CallToolResult, McpError> {
    let caches = cache.cache_names().await?;
    json_result(&CacheKeysOutput { caches })
}
