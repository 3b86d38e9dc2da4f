//! Shared types, error enums, and ingest outcomes for daladala-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrackingConfig;

/// Opaque stable vehicle identifier.
pub type VehicleId = String;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A report whose payload is unusable. Returned to the producer; the store
/// is never touched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("recorded_at {0} is not a finite timestamp")]
    NonFiniteTimestamp(f64),
    #[error(
        "recorded_at {recorded_at} runs more than {tolerance}s ahead of received_at {received_at}"
    )]
    FutureTimestamp {
        recorded_at: f64,
        received_at: f64,
        tolerance: f64,
    },
}

/// Invalid tracking configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive duration, got {value}")]
    NonPositiveDuration { name: &'static str, value: f64 },
    #[error("offline_after ({offline_after}) must exceed stale_after ({stale_after})")]
    OfflineNotAfterStale { stale_after: f64, offline_after: f64 },
}

// ---------------------------------------------------------------------------
// Position reports
// ---------------------------------------------------------------------------

/// A single accepted position observation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub vehicle_id: VehicleId,
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub speed_kmh: Option<f64>,
    /// Producer timestamp (UNIX epoch seconds).
    pub recorded_at: f64,
    /// Ingest timestamp (UNIX epoch seconds), stamped by the ingestor.
    pub received_at: f64,
}

// ---------------------------------------------------------------------------
// Vehicle state
// ---------------------------------------------------------------------------

/// Derived liveness status based on silence duration, not explicit signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Stale,
    Offline,
}

impl VehicleStatus {
    /// Status as a pure function of silence duration against the thresholds.
    pub fn from_silence(silence: f64, config: &TrackingConfig) -> VehicleStatus {
        if silence > config.offline_after {
            VehicleStatus::Offline
        } else if silence > config.stale_after {
            VehicleStatus::Stale
        } else {
            VehicleStatus::Active
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleStatus::Active => write!(f, "active"),
            VehicleStatus::Stale => write!(f, "stale"),
            VehicleStatus::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(VehicleStatus::Active),
            "stale" => Ok(VehicleStatus::Stale),
            "offline" => Ok(VehicleStatus::Offline),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Latest known state for a single vehicle.
///
/// Owned by `VehicleStateStore`; callers only ever see snapshot clones with
/// `status` recomputed at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    pub vehicle_id: VehicleId,
    pub latest_report: PositionReport,
    pub status: VehicleStatus,
    /// Ingest time of the latest accepted report (not the producer time).
    pub last_updated_at: f64,
    /// Strictly increasing per accepted report; the tie-break authority over
    /// wall-clock time.
    pub sequence: u64,
}

impl VehicleState {
    /// Initial state for a vehicle's first accepted report.
    pub(crate) fn first(report: PositionReport) -> Self {
        VehicleState {
            vehicle_id: report.vehicle_id.clone(),
            last_updated_at: report.received_at,
            latest_report: report,
            status: VehicleStatus::Active,
            sequence: 1,
        }
    }

    /// Seconds of silence as of `now`.
    pub fn silence(&self, now: f64) -> f64 {
        now - self.last_updated_at
    }

    /// Status derived from silence as of `now`.
    pub fn status_at(&self, now: f64, config: &TrackingConfig) -> VehicleStatus {
        VehicleStatus::from_silence(self.silence(now), config)
    }
}

// ---------------------------------------------------------------------------
// Ingest outcomes
// ---------------------------------------------------------------------------

/// Why a semantically valid report was dropped. Distinguished for
/// observability; neither reason mutates the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectReason {
    /// Superseded by an already-stored report.
    Stale,
    /// Exact resend of the stored report.
    Duplicate,
}

/// Result of applying a validated report, returned as a value — never an
/// exception — so high-volume ingest callers handle every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum IngestOutcome {
    Accepted {
        sequence: u64,
        /// First report ever seen for this vehicle.
        is_new: bool,
    },
    Rejected {
        reason: RejectReason,
    },
}

// ---------------------------------------------------------------------------
// Fleet filters
// ---------------------------------------------------------------------------

/// Inclusive geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Predicate over bounding box and/or status for fleet listings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FleetFilter {
    pub bounds: Option<BoundingBox>,
    pub status: Option<VehicleStatus>,
}

impl FleetFilter {
    pub(crate) fn matches(&self, state: &VehicleState) -> bool {
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(state.latest_report.lat, state.latest_report.lon) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if state.status != status {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
