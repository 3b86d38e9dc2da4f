//! Background status sweeps.
//!
//! The reaper recomputes each vehicle's derived status so stored state never
//! drifts more than one sweep interval behind the timestamps. A sweep only
//! writes the single status field under that vehicle's shard lock, so it
//! never blocks ingestion or queries for long. Scheduling is the caller's
//! job (`daladala-server` drives this on a tokio interval); the core exposes
//! just the synchronous sweep.

use std::sync::Arc;

use serde::Serialize;

use crate::store::VehicleStateStore;
use crate::types::VehicleStatus;

/// Per-sweep outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub checked: usize,
    pub marked_stale: usize,
    pub marked_offline: usize,
    /// Vehicles removed concurrently between key collection and refresh.
    pub skipped: usize,
}

pub struct ExpiryReaper {
    store: Arc<VehicleStateStore>,
}

impl ExpiryReaper {
    pub fn new(store: Arc<VehicleStateStore>) -> Self {
        ExpiryReaper { store }
    }

    /// Recompute status for every vehicle from `now - last_updated_at`.
    ///
    /// Idempotent and order-independent across vehicles. A vehicle that
    /// disappears mid-sweep is logged and skipped; the sweep always finishes.
    pub fn sweep(&self, now: f64) -> SweepStats {
        let mut stats = SweepStats::default();

        for vehicle_id in self.store.vehicle_ids() {
            match self.store.refresh_status(&vehicle_id, now) {
                Some((previous, current)) => {
                    stats.checked += 1;
                    if previous != current {
                        match current {
                            VehicleStatus::Stale => stats.marked_stale += 1,
                            VehicleStatus::Offline => stats.marked_offline += 1,
                            VehicleStatus::Active => {}
                        }
                        tracing::info!(
                            vehicle = %vehicle_id,
                            from = %previous,
                            to = %current,
                            "vehicle status transition"
                        );
                    }
                }
                None => {
                    stats.skipped += 1;
                    tracing::debug!(vehicle = %vehicle_id, "vehicle removed mid-sweep");
                }
            }
        }

        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
