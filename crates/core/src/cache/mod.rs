//! SQLite-backed storage for named response caches.
//!
//! This module provides a persistent cache store using SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Any number of named stores, one per worker version
//! - Entries keyed by request identity (method + canonical URL)
//! - Overwrite-on-write semantics (last writer wins)
//! - All-or-nothing bulk writes for precaching
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::CacheStorage;
