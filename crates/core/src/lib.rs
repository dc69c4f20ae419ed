//! Core types and shared functionality for barstock-sw.
//!
//! This crate provides:
//! - Named, versioned response cache with SQLite backend
//! - Request/response model shared with the network client
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Request, RequestMode, Response};
