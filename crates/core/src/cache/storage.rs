//! Cache store abstraction used by the worker.
//!
//! The worker only talks to this trait, so the store can be swapped
//! (or instrumented in tests) without touching routing logic.

use super::connection::CacheDb;
use crate::{Error, Request, Response};

/// Named cache stores holding captured responses.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store by name, creating it if absent.
    async fn open_cache(&self, name: &str) -> Result<(), Error>;

    /// All store names, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and its entries. Returns false if it did not exist.
    async fn delete_cache(&self, name: &str) -> Result<bool, Error>;

    /// Look up a request in a single store.
    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request across every store, oldest first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a response, overwriting any previous entry.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store every response or none of them.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open_cache(&self, name: &str) -> Result<(), Error> {
        CacheDb::open_cache(self, name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.cache_names().await
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_cache(self, name).await
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.match_entry(name, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        CacheDb::match_any(self, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.put_entries(name, entries).await
    }
}
