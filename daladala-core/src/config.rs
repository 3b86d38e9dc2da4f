//! Tracking configuration consumed by the core.
//!
//! All durations are seconds. There are no defaults here — the integrator
//! (CLI flags or environment in `daladala-server`) must set every value
//! explicitly, and the constructor rejects inconsistent combinations.

use crate::types::ConfigError;

/// Timing thresholds for ingestion and liveness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConfig {
    /// Seconds of silence before a vehicle is considered Stale.
    pub stale_after: f64,
    /// Seconds of silence before a vehicle is considered Offline.
    /// Must exceed `stale_after`.
    pub offline_after: f64,
    /// Maximum seconds a report's `recorded_at` may run ahead of the ingest
    /// clock before the report is rejected as clock-skewed.
    pub future_skew_tolerance: f64,
    /// Seconds between reaper sweeps.
    pub reaper_interval: f64,
}

impl TrackingConfig {
    /// Build a validated configuration.
    pub fn new(
        stale_after: f64,
        offline_after: f64,
        future_skew_tolerance: f64,
        reaper_interval: f64,
    ) -> Result<Self, ConfigError> {
        let config = TrackingConfig {
            stale_after,
            offline_after,
            future_skew_tolerance,
            reaper_interval,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("stale_after", self.stale_after),
            ("offline_after", self.offline_after),
            ("reaper_interval", self.reaper_interval),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveDuration { name, value });
            }
        }
        // Zero tolerance is allowed: reject any future-dated report.
        if !(self.future_skew_tolerance >= 0.0) {
            return Err(ConfigError::NonPositiveDuration {
                name: "future_skew_tolerance",
                value: self.future_skew_tolerance,
            });
        }
        if self.offline_after <= self.stale_after {
            return Err(ConfigError::OfflineNotAfterStale {
                stale_after: self.stale_after,
                offline_after: self.offline_after,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = TrackingConfig::new(60.0, 300.0, 30.0, 5.0).unwrap();
        assert_eq!(config.stale_after, 60.0);
        assert_eq!(config.offline_after, 300.0);
    }

    #[test]
    fn test_zero_skew_tolerance_allowed() {
        assert!(TrackingConfig::new(60.0, 300.0, 0.0, 5.0).is_ok());
    }

    #[test]
    fn test_non_positive_durations_rejected() {
        assert!(TrackingConfig::new(0.0, 300.0, 30.0, 5.0).is_err());
        assert!(TrackingConfig::new(60.0, -1.0, 30.0, 5.0).is_err());
        assert!(TrackingConfig::new(60.0, 300.0, -0.1, 5.0).is_err());
        assert!(TrackingConfig::new(60.0, 300.0, 30.0, 0.0).is_err());
    }

    #[test]
    fn test_nan_duration_rejected() {
        assert!(TrackingConfig::new(f64::NAN, 300.0, 30.0, 5.0).is_err());
    }

    #[test]
    fn test_offline_must_exceed_stale() {
        let err = TrackingConfig::new(300.0, 60.0, 30.0, 5.0).unwrap_err();
        assert!(matches!(err, ConfigError::OfflineNotAfterStale { .. }));

        // Equal is also invalid
        assert!(TrackingConfig::new(60.0, 60.0, 30.0, 5.0).is_err());
    }
}
