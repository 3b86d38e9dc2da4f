//! daladala-core: Live position engine for transit vehicle tracking.
//!
//! No async, no I/O — just the tracking logic. This crate is the shared core
//! used by `daladala-server` (web transport + reaper scheduling); it accepts
//! position reports, keeps the latest known state per vehicle, and serves
//! consistent snapshots under concurrent readers and writers.

pub mod config;
pub mod ingest;
pub mod query;
pub mod reaper;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use config::TrackingConfig;
pub use ingest::{RawReport, UpdateIngestor};
pub use query::SnapshotQueryEngine;
pub use reaper::{ExpiryReaper, SweepStats};
pub use store::VehicleStateStore;
pub use types::*;
