//! sw_fetch tool implementation.
//!
//! Replays a page request through the worker's fetch handler. Requests the
//! worker does not intercept go straight to the network, as the browser
//! would do.

use barstock_client::{CacheManager, FetchOutcome, Network, fetch::canonicalize};
use barstock_core::{Error, Request, RequestMode, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the deployment base URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: Option<RequestMode>,
}

/// A response as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseOutput {
    /// URL of the response (after redirects).
    pub url: String,
    pub status: u16,
    /// One of "network", "cache", "offline_fallback", "passthrough".
    pub source: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

impl ResponseOutput {
    pub fn new(response: Response, source: &str) -> Self {
        Self {
            url: response.url,
            status: response.status,
            source: source.to_string(),
            headers: response.headers,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    worker: &CacheManager, network: &dyn Network, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, Some(&worker.manifest().base_url))
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", params.url, e)))?;

    let mut request = Request::get(url).with_mode(params.mode.unwrap_or_default());
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method);
    }

    let output = match worker.handle_fetch(request.clone()).await? {
        FetchOutcome::Respond { response, source } => ResponseOutput::new(response, source.as_str()),
        FetchOutcome::Passthrough => {
            tracing::debug!(url = %request.url, method = %request.method, "passthrough");
            ResponseOutput::new(network.fetch(&request).await?, "passthrough")
        }
    };

    json_result(&output)
}
