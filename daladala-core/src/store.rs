//! Authoritative in-memory table of latest known state per vehicle.
//!
//! Backed by a `DashMap` so unrelated vehicles never serialize against each
//! other: the `entry()` API holds a shard write lock for the duration of the
//! acceptance check + mutation, which makes upsert atomic per vehicle.
//! Readers get whole-record snapshot clones, never live references, so a
//! caller can't observe a state mixing pre- and post-upsert fields.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::config::TrackingConfig;
use crate::types::*;

// ---------------------------------------------------------------------------
// Report ordering
// ---------------------------------------------------------------------------

/// How a new report relates to the currently stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportOrder {
    Newer,
    Duplicate,
    Stale,
}

/// Total order over (recorded_at, received_at). Exact-timestamp ties break
/// deterministically by arrival, so producers resending identical producer
/// timestamps can't make the stored state flap.
fn compare_reports(new: &PositionReport, current: &PositionReport) -> ReportOrder {
    if new.recorded_at > current.recorded_at {
        ReportOrder::Newer
    } else if new.recorded_at < current.recorded_at {
        ReportOrder::Stale
    } else if new.received_at > current.received_at {
        ReportOrder::Newer
    } else if new.received_at < current.received_at {
        ReportOrder::Stale
    } else {
        ReportOrder::Duplicate
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Observability counters, incremented on every upsert decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub accepted: u64,
    pub rejected_stale: u64,
    pub rejected_duplicate: u64,
}

/// Mapping from `VehicleId` to latest `VehicleState`, safe under concurrent
/// readers and writers.
pub struct VehicleStateStore {
    vehicles: DashMap<VehicleId, VehicleState>,
    config: TrackingConfig,
    accepted: AtomicU64,
    rejected_stale: AtomicU64,
    rejected_duplicate: AtomicU64,
}

impl VehicleStateStore {
    pub fn new(config: TrackingConfig) -> Self {
        VehicleStateStore {
            vehicles: DashMap::new(),
            config,
            accepted: AtomicU64::new(0),
            rejected_stale: AtomicU64::new(0),
            rejected_duplicate: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Apply a validated report. Accepted only for a first sighting or a
    /// report newer than the stored one; rejections leave the state untouched.
    ///
    /// On acceptance the vehicle's sequence increments, `last_updated_at` is
    /// set to the ingest time, and status resets to Active.
    pub fn upsert(&self, report: PositionReport) -> IngestOutcome {
        let outcome = match self.vehicles.entry(report.vehicle_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                match compare_reports(&report, &state.latest_report) {
                    ReportOrder::Newer => {
                        state.sequence += 1;
                        state.last_updated_at = report.received_at;
                        state.status = VehicleStatus::Active;
                        state.latest_report = report;
                        IngestOutcome::Accepted {
                            sequence: state.sequence,
                            is_new: false,
                        }
                    }
                    ReportOrder::Duplicate => IngestOutcome::Rejected {
                        reason: RejectReason::Duplicate,
                    },
                    ReportOrder::Stale => IngestOutcome::Rejected {
                        reason: RejectReason::Stale,
                    },
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(VehicleState::first(report));
                IngestOutcome::Accepted {
                    sequence: 1,
                    is_new: true,
                }
            }
        };

        match outcome {
            IngestOutcome::Accepted { .. } => self.accepted.fetch_add(1, Ordering::Relaxed),
            IngestOutcome::Rejected {
                reason: RejectReason::Stale,
            } => self.rejected_stale.fetch_add(1, Ordering::Relaxed),
            IngestOutcome::Rejected {
                reason: RejectReason::Duplicate,
            } => self.rejected_duplicate.fetch_add(1, Ordering::Relaxed),
        };
        outcome
    }

    /// Snapshot copy of a vehicle's state with status recomputed as of `now`.
    pub fn get(&self, vehicle_id: &str, now: f64) -> Option<VehicleState> {
        let mut state = self.vehicles.get(vehicle_id)?.clone();
        state.status = state.status_at(now, &self.config);
        Some(state)
    }

    /// Matching vehicles as of call time, sorted by vehicle_id for
    /// deterministic pagination. Each entry is its vehicle's latest accepted
    /// state at the moment it was read; the list as a whole is not pinned to
    /// a single global instant.
    pub fn list(&self, filter: &FleetFilter, now: f64) -> Vec<VehicleState> {
        let mut states: Vec<VehicleState> = self
            .vehicles
            .iter()
            .map(|entry| {
                let mut state = entry.value().clone();
                state.status = state.status_at(now, &self.config);
                state
            })
            .filter(|state| filter.matches(state))
            .collect();
        states.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        states
    }

    /// Administrative removal; not reachable from ordinary ingestion.
    pub fn remove(&self, vehicle_id: &str) -> Option<VehicleState> {
        self.vehicles.remove(vehicle_id).map(|(_, state)| state)
    }

    /// Recompute and store the derived status for one vehicle. Returns the
    /// (previous, current) pair, or `None` if the vehicle was removed
    /// concurrently.
    pub fn refresh_status(&self, vehicle_id: &str, now: f64) -> Option<(VehicleStatus, VehicleStatus)> {
        let mut entry = self.vehicles.get_mut(vehicle_id)?;
        let previous = entry.status;
        let current = entry.status_at(now, &self.config);
        entry.status = current;
        Some((previous, current))
    }

    /// All known vehicle ids, unordered.
    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn counters(&self) -> CounterSnapshot {
        CounterSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_stale: self.rejected_stale.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
