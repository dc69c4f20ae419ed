//! Offline cache worker.
//!
//! The [`CacheManager`] owns one versioned cache store and reacts to three
//! lifecycle events:
//!
//! - **install**: precache every core asset, all or nothing
//! - **activate**: drop every store whose name is not the current version,
//!   then claim clients
//! - **fetch**: route each request (see [`routing::route`]) and answer it with
//!   network-first (navigations) or stale-while-revalidate (sub-resources)
//!
//! Store and network failures degrade to cached or offline-shell content.
//! Only when neither exists does a fetch fail.

pub mod lifecycle;
pub mod manifest;
pub mod routing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use barstock_core::{CacheStorage, Error, Request, Response};
use futures_util::future::try_join_all;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::fetch::Network;

pub use lifecycle::WorkerState;
pub use manifest::Manifest;
pub use routing::{BypassReason, RouteDecision, route};

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::OfflineFallback => "offline_fallback",
        }
    }
}

/// Result of handling a fetch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller performs the default network request.
    Passthrough,
    /// Answered by the worker.
    Respond { response: Response, source: ResponseSource },
}

/// Summary of [`CacheManager::install_and_activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub assets: usize,
    pub deleted: Vec<String>,
}

/// Owns the current cache store and handles lifecycle and fetch events.
pub struct CacheManager {
    manifest: Manifest,
    store: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    background: Mutex<JoinSet<()>>,
}

impl CacheManager {
    pub fn new(manifest: Manifest, store: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            manifest,
            store,
            network,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            background: Mutex::new(JoinSet::new()),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Set by a successful install: activate without waiting for old clients to close.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Precache the core asset list into the current store.
    ///
    /// Every asset is fetched before anything is written; a transport error
    /// or a non-ok status on any of them fails the install and leaves the
    /// store without new entries. Returns the number of assets cached.
    pub async fn install(&self) -> Result<usize, Error> {
        self.state.write().await.begin_install()?;
        tracing::info!(cache = %self.manifest.cache_name, assets = self.manifest.core_assets.len(), "installing");

        match self.precache().await {
            Ok(count) => {
                *self.state.write().await = WorkerState::Installed;
                self.skip_waiting.store(true, Ordering::Release);
                tracing::info!(cache = %self.manifest.cache_name, count, "installed");
                Ok(count)
            }
            Err(err) => {
                *self.state.write().await = WorkerState::Redundant;
                tracing::warn!(cache = %self.manifest.cache_name, error = %err, "install failed");
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let cache_name = &self.manifest.cache_name;
        self.store.open_cache(cache_name).await?;

        let fetches = self.manifest.core_assets.iter().map(|url| {
            let request = Request::get(url.clone());
            async move {
                let response = self
                    .network
                    .fetch(&request)
                    .await
                    .map_err(|e| Error::InstallFailed(format!("{}: {}", request.url, e)))?;
                if !response.is_ok() {
                    return Err(Error::InstallFailed(format!("{}: status {}", request.url, response.status)));
                }
                Ok((request, response))
            }
        });
        let entries = try_join_all(fetches).await?;

        self.store.put_all(cache_name, &entries).await?;
        Ok(entries.len())
    }

    /// Install, then activate right away when the install asked to skip waiting.
    ///
    /// Returns the number of assets cached and the stores deleted by the
    /// activation.
    pub async fn install_and_activate(&self) -> Result<Installation, Error> {
        let assets = self.install().await?;
        let deleted = if self.skip_waiting_requested() { self.activate().await? } else { Vec::new() };
        Ok(Installation { assets, deleted })
    }

    /// Delete every store except the current one, then claim clients.
    ///
    /// Returns the names of the deleted stores.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.state.write().await.begin_activate()?;

        match self.prune_stale_caches().await {
            Ok(deleted) => {
                *self.state.write().await = WorkerState::Activated;
                tracing::info!(cache = %self.manifest.cache_name, deleted = deleted.len(), "activated; claimed clients");
                Ok(deleted)
            }
            Err(err) => {
                *self.state.write().await = WorkerState::Installed;
                tracing::warn!(cache = %self.manifest.cache_name, error = %err, "activation failed");
                Err(err)
            }
        }
    }

    async fn prune_stale_caches(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store.keys().await? {
            if name == self.manifest.cache_name {
                continue;
            }
            if self.store.delete_cache(&name).await? {
                tracing::debug!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Handle a fetch event from a controlled page.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoResponse` when the network failed and no fallback
    /// is cached.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        if !self.state.read().await.can_intercept_fetch() {
            return Ok(FetchOutcome::Passthrough);
        }

        match route(&request, &self.manifest) {
            RouteDecision::Passthrough(reason) => {
                tracing::trace!(url = %request.url, ?reason, "not intercepted");
                Ok(FetchOutcome::Passthrough)
            }
            RouteDecision::NetworkFirst => self.network_first(request).await,
            RouteDecision::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    async fn network_first(&self, request: Request) -> Result<FetchOutcome, Error> {
        match self.network.fetch(&request).await {
            Ok(response) => {
                let shell = Request::get(self.manifest.offline_fallback.clone());
                if let Err(err) = self.store.put(&self.manifest.cache_name, &shell, &response).await {
                    tracing::warn!(url = %request.url, error = %err, "failed to persist offline shell");
                }
                Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "navigation failed; serving offline shell");
                self.offline_fallback(&request).await
            }
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Result<FetchOutcome, Error> {
        let cached = self.store.match_any(&request).await.unwrap_or_else(|err| {
            tracing::warn!(url = %request.url, error = %err, "cache lookup failed");
            None
        });

        if let Some(response) = cached {
            self.spawn_revalidation(request);
            return Ok(FetchOutcome::Respond { response, source: ResponseSource::Cache });
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.is_ok()
                    && let Err(err) = self.store.put(&self.manifest.cache_name, &request, &response).await
                {
                    tracing::warn!(url = %request.url, error = %err, "failed to cache response");
                }
                Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "fetch failed; serving offline shell");
                self.offline_fallback(&request).await
            }
        }
    }

    async fn offline_fallback(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let shell = Request::get(self.manifest.offline_fallback.clone());
        match self.store.match_any(&shell).await {
            Ok(Some(response)) => Ok(FetchOutcome::Respond { response, source: ResponseSource::OfflineFallback }),
            Ok(None) => Err(Error::NoResponse(request.url.to_string())),
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "offline shell lookup failed");
                Err(Error::NoResponse(request.url.to_string()))
            }
        }
    }

    /// Refresh a cached entry without blocking the response.
    fn spawn_revalidation(&self, request: Request) {
        let store = Arc::clone(&self.store);
        let network = Arc::clone(&self.network);
        let cache_name = self.manifest.cache_name.clone();

        let mut tasks = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { revalidate(store.as_ref(), network.as_ref(), &cache_name, &request).await });
    }

    /// Wait for every background revalidation started so far.
    pub async fn wait_until_idle(&self) {
        let mut tasks = std::mem::take(&mut *self.background.lock().unwrap_or_else(PoisonError::into_inner));
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::debug!(error = %err, "revalidation task aborted");
            }
        }
    }
}

/// Overwrite the entry when the network returns an ok response.
///
/// Failures are dropped: the cached copy has already been served.
async fn revalidate(store: &dyn CacheStorage, network: &dyn Network, cache_name: &str, request: &Request) {
    match network.fetch(request).await {
        Ok(response) if response.is_ok() => {
            if let Err(err) = store.put(cache_name, request, &response).await {
                tracing::debug!(url = %request.url, error = %err, "revalidation write failed");
            }
        }
        Ok(response) => {
            tracing::debug!(url = %request.url, status = response.status, "revalidation returned non-ok status");
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "revalidation fetch failed");
        }
    }
}
