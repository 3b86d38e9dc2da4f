//! Report validation and acceptance ordering.
//!
//! Pure decision function plus one call into `VehicleStateStore::upsert`;
//! no I/O here. The transport layer hands over deserialized raw reports and
//! translates the returned outcome into a transport-level response.

use std::sync::Arc;

use serde::Deserialize;

use crate::store::VehicleStateStore;
use crate::types::*;

/// A position report as submitted by a producer, before validation.
/// `received_at` is not part of the payload — the ingestor stamps it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    pub vehicle_id: VehicleId,
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub recorded_at: f64,
}

/// Validates and normalizes incoming reports, then applies them to the store.
pub struct UpdateIngestor {
    store: Arc<VehicleStateStore>,
}

impl UpdateIngestor {
    pub fn new(store: Arc<VehicleStateStore>) -> Self {
        UpdateIngestor { store }
    }

    /// Validate a raw report and apply it.
    ///
    /// `received_at` is the ingest wall-clock time (UNIX epoch seconds).
    /// Validation failures never touch the store; staleness and duplicate
    /// outcomes come back as `IngestOutcome::Rejected` values.
    pub fn ingest(
        &self,
        raw: RawReport,
        received_at: f64,
    ) -> Result<IngestOutcome, ValidationError> {
        let report = self.validate(raw, received_at)?;
        Ok(self.store.upsert(report))
    }

    fn validate(
        &self,
        raw: RawReport,
        received_at: f64,
    ) -> Result<PositionReport, ValidationError> {
        if !(-90.0..=90.0).contains(&raw.lat) {
            return Err(ValidationError::LatitudeOutOfRange(raw.lat));
        }
        if !(-180.0..=180.0).contains(&raw.lon) {
            return Err(ValidationError::LongitudeOutOfRange(raw.lon));
        }
        if !raw.recorded_at.is_finite() {
            return Err(ValidationError::NonFiniteTimestamp(raw.recorded_at));
        }
        let tolerance = self.store.config().future_skew_tolerance;
        if raw.recorded_at - received_at > tolerance {
            return Err(ValidationError::FutureTimestamp {
                recorded_at: raw.recorded_at,
                received_at,
                tolerance,
            });
        }

        Ok(PositionReport {
            vehicle_id: raw.vehicle_id,
            lat: raw.lat,
            lon: raw.lon,
            heading_deg: raw.heading_deg,
            speed_kmh: raw.speed_kmh,
            recorded_at: raw.recorded_at,
            received_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingConfig;

    fn make_ingestor() -> (UpdateIngestor, Arc<VehicleStateStore>) {
        let config = TrackingConfig::new(60.0, 300.0, 30.0, 5.0).unwrap();
        let store = Arc::new(VehicleStateStore::new(config));
        (UpdateIngestor::new(Arc::clone(&store)), store)
    }

    fn raw(vehicle_id: &str, lat: f64, lon: f64, recorded_at: f64) -> RawReport {
        RawReport {
            vehicle_id: vehicle_id.to_string(),
            lat,
            lon,
            heading_deg: None,
            speed_kmh: None,
            recorded_at,
        }
    }

    #[test]
    fn test_valid_report_accepted() {
        let (ingestor, store) = make_ingestor();
        let outcome = ingestor.ingest(raw("bus-12", -6.8, 39.3, 100.0), 100.5).unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Accepted {
                sequence: 1,
                is_new: true
            }
        );

        let state = store.get("bus-12", 101.0).unwrap();
        assert_eq!(state.latest_report.received_at, 100.5);
    }

    #[test]
    fn test_latitude_out_of_range() {
        let (ingestor, store) = make_ingestor();
        let err = ingestor.ingest(raw("bus-12", 90.1, 39.3, 100.0), 100.5).unwrap_err();
        assert_eq!(err, ValidationError::LatitudeOutOfRange(90.1));
        assert!(store.is_empty());

        assert!(ingestor.ingest(raw("bus-12", -91.0, 39.3, 100.0), 100.5).is_err());
        // Edges are valid
        assert!(ingestor.ingest(raw("bus-12", 90.0, 39.3, 100.0), 100.5).is_ok());
    }

    #[test]
    fn test_longitude_out_of_range() {
        let (ingestor, _) = make_ingestor();
        let err = ingestor
            .ingest(raw("bus-12", -6.8, 180.5, 100.0), 100.5)
            .unwrap_err();
        assert_eq!(err, ValidationError::LongitudeOutOfRange(180.5));
        assert!(ingestor.ingest(raw("bus-12", -6.8, -180.0, 100.0), 100.5).is_ok());
    }

    #[test]
    fn test_nan_coordinates_rejected() {
        let (ingestor, _) = make_ingestor();
        assert!(ingestor.ingest(raw("bus-12", f64::NAN, 39.3, 100.0), 100.5).is_err());
        assert!(ingestor.ingest(raw("bus-12", -6.8, f64::NAN, 100.0), 100.5).is_err());
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        let (ingestor, _) = make_ingestor();
        let err = ingestor
            .ingest(raw("bus-12", -6.8, 39.3, f64::NAN), 100.5)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonFiniteTimestamp(_)));
    }

    #[test]
    fn test_future_skew_rejected_beyond_tolerance() {
        let (ingestor, store) = make_ingestor();
        // 31s ahead of the ingest clock, tolerance 30s
        let err = ingestor.ingest(raw("bus-12", -6.8, 39.3, 131.0), 100.0).unwrap_err();
        assert!(matches!(err, ValidationError::FutureTimestamp { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_future_skew_within_tolerance_accepted() {
        let (ingestor, _) = make_ingestor();
        // 30s ahead is exactly the tolerance — allowed
        assert!(ingestor.ingest(raw("bus-12", -6.8, 39.3, 130.0), 100.0).is_ok());
    }

    #[test]
    fn test_stale_and_duplicate_pass_through() {
        let (ingestor, _) = make_ingestor();
        ingestor.ingest(raw("bus-12", -6.8, 39.3, 100.0), 100.5).unwrap();

        let dup = ingestor.ingest(raw("bus-12", -6.8, 39.3, 100.0), 100.5).unwrap();
        assert_eq!(
            dup,
            IngestOutcome::Rejected {
                reason: RejectReason::Duplicate
            }
        );

        let stale = ingestor.ingest(raw("bus-12", -6.8, 39.3, 90.0), 101.0).unwrap();
        assert_eq!(
            stale,
            IngestOutcome::Rejected {
                reason: RejectReason::Stale
            }
        );
    }
}
