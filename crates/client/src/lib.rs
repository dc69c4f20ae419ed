//! Client code for barstock-sw.
//!
//! This crate provides the HTTP network client and the offline cache worker
//! (lifecycle handling and fetch routing) shared by the server.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network};

pub use worker::{CacheManager, FetchOutcome, Installation, Manifest, ResponseSource, RouteDecision, WorkerState};
