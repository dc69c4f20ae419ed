//! MCP server handler implementation.
//!
//! Routes tool calls to the worker lifecycle, the fetch handler and the
//! cache inspection tools.
use std::sync::Arc;

use barstock_client::{CacheManager, Network};
use barstock_core::CacheDb;

use crate::tools::cache::{CacheGetParams, get_impl, keys_impl};
use crate::tools::{SwFetchParams, activate_impl, fetch_impl, install_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for barstock-sw.
#[derive(Clone)]
pub struct BarStockServer {
    worker: Arc<CacheManager>,
    db: CacheDb,
    network: Arc<dyn Network>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BarStockServer {
    pub fn new(worker: Arc<CacheManager>, db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { worker, db, network, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Precache the core asset list into the current cache version (all or none), then activate it."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Delete every cache store except the current version and start intercepting fetches.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Replay a page request through the worker.
    ///
    /// Navigations are network-first with the offline shell as fallback;
    /// same-origin GETs are stale-while-revalidate.
    #[tool(
        description = "Fetch a URL as a controlled page would. Returns status, headers, body and where the response came from (network, cache, offline_fallback, passthrough)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, self.network.as_ref(), params.0).await
    }

    #[tool(description = "List cache store names, oldest first.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.db).await
    }

    #[tool(description = "Return the response stored for a URL in the current cache version.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.db, self.worker.manifest(), params.0).await
    }
}

impl ServerHandler for BarStockServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "barstock-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
