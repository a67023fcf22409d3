//! Server sync: client trait, HTTP implementation, manager and background worker.

pub mod client;
pub mod http;
pub mod manager;
pub mod worker;

pub use client::{SyncClient, SyncConflict, SyncError, SyncResponse, parse_timestamp};
pub use http::{HttpSyncClient, HttpSyncConfig};
pub use manager::{Migration, SyncManager, SyncOutcome};
pub use worker::SyncWorker;
