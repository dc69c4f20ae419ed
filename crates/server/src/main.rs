//! barstock-sw server entry point.
//!
//! Boots the offline cache worker and serves it over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use barstock_client::{CacheManager, FetchClient, FetchConfig, Manifest, Network};
use barstock_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(cache = %config.cache_name, base = %config.base_url, db = %config.db_path.display(), "starting barstock-sw on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let manifest = Manifest::from_config(&config)?;
    let worker = Arc::new(CacheManager::new(manifest, Arc::new(db.clone()), Arc::clone(&network)));

    if let Err(err) = worker.install_and_activate().await {
        tracing::warn!(error = %err, state = %worker.state().await, "startup install failed; retry with sw_install or sw_activate");
    }

    let handler = handler::BarStockServer::new(worker, db, network);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
