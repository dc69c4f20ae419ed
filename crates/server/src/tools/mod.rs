//! MCP tool implementations.
//!
//! Each tool is a plain async function over the worker or the cache DB;
//! the handler only wires parameters through.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

pub use lifecycle::{activate_impl, install_impl};
pub use sw_fetch::{ResponseOutput, SwFetchParams, fetch_impl};

use barstock_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Serialize a tool output as a pretty JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
