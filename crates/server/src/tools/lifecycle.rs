//! sw_install and sw_activate tool implementations.

use barstock_client::CacheManager;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Store the assets were written to.
    pub cache_name: String,
    /// Number of core assets precached.
    pub assets: usize,
    /// Stale stores deleted by the activation that follows a successful install.
    pub deleted: Vec<String>,
    /// Worker state after the install.
    pub state: String,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    /// The store kept as current.
    pub cache_name: String,
    /// Stale stores that were deleted.
    pub deleted: Vec<String>,
    /// Worker state after the activation.
    pub state: String,
}

/// Implementation of the sw_install tool.
///
/// A successful install skips waiting, so the worker is activated as well.
pub async fn install_impl(worker: &CacheManager) -> Result<CallToolResult, McpError> {
    let installation = worker.install_and_activate().await?;
    let output = InstallOutput {
        cache_name: worker.manifest().cache_name.clone(),
        assets: installation.assets,
        deleted: installation.deleted,
        state: worker.state().await.to_string(),
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &CacheManager) -> Result<CallToolResult, McpError> {
    let deleted = worker.activate().await?;
    let output = ActivateOutput {
        cache_name: worker.manifest().cache_name.clone(),
        deleted,
        state: worker.state().await.to_string(),
    };
    json_result(&output)
}
