//! Read-only projections over the vehicle state store.
//!
//! Every returned state is an atomic per-vehicle snapshot: a whole-record
//! clone taken under the vehicle's shard lock, never a live reference.
//! Fleet listings are consistent-but-not-linearizable — each included vehicle
//! reflects its latest accepted state at the moment it was read.

use std::sync::Arc;

use crate::store::VehicleStateStore;
use crate::types::*;

pub struct SnapshotQueryEngine {
    store: Arc<VehicleStateStore>,
}

impl SnapshotQueryEngine {
    pub fn new(store: Arc<VehicleStateStore>) -> Self {
        SnapshotQueryEngine { store }
    }

    /// Current state for one vehicle, or `None` for an unknown id.
    pub fn get_vehicle(&self, vehicle_id: &str, now: f64) -> Option<VehicleState> {
        self.store.get(vehicle_id, now)
    }

    /// All matching vehicles, ordered by vehicle_id so paginating callers see
    /// a deterministic sequence.
    pub fn list_fleet(
        &self,
        bounds: Option<BoundingBox>,
        status: Option<VehicleStatus>,
        now: f64,
    ) -> Vec<VehicleState> {
        self.store.list(&FleetFilter { bounds, status }, now)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
