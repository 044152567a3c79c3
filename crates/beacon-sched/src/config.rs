//! Scheduler configuration

use std::time::Duration;

use serde::{Serialize, Serializer};

use beacon_core::{BeaconError, BeaconResult, Priority, PriorityLevel};

use crate::Lane;

/// Scheduler configuration
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Scores at or above this go to the critical lane
    pub critical_threshold: f64,
    /// Batch timer period
    #[serde(rename = "batchIntervalMs", serialize_with = "serialize_millis")]
    pub batch_interval: Duration,
    /// Items drained per batch tick
    pub max_batch_size: usize,
}

fn serialize_millis<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(d.as_millis() as u64)
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            critical_threshold: 7.5,
            batch_interval: Duration::from_millis(5000),
            max_batch_size: 10,
        }
    }
}

impl SchedulerConfig {
    /// Configuration for battery-bound gateways: fewer, larger uploads
    pub fn low_power() -> Self {
        SchedulerConfig {
            critical_threshold: 8.0,
            batch_interval: Duration::from_secs(30),
            max_batch_size: 50,
        }
    }

    /// Configuration for mains-powered gateways with a good uplink
    pub fn responsive() -> Self {
        SchedulerConfig {
            critical_threshold: 7.0,
            batch_interval: Duration::from_millis(1000),
            max_batch_size: 5,
        }
    }

    pub fn with_critical_threshold(mut self, threshold: f64) -> Self {
        self.critical_threshold = threshold;
        self
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Reject configurations with an ill-defined drain cadence
    pub fn validate(&self) -> BeaconResult<()> {
        if self.batch_interval.is_zero() {
            return Err(BeaconError::InvalidConfig(
                "batch_interval must be positive".into(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(BeaconError::InvalidConfig(
                "max_batch_size must be positive".into(),
            ));
        }
        if !(0.0..=10.0).contains(&self.critical_threshold) {
            return Err(BeaconError::InvalidConfig(format!(
                "critical_threshold must be within [0, 10], got {}",
                self.critical_threshold
            )));
        }
        Ok(())
    }

    /// Pick the lane for a scored event.
    /// Threshold and level are checked independently; either one is enough.
    pub fn route(&self, priority: &Priority) -> Lane {
        if priority.score.as_f64() >= self.critical_threshold
            || priority.level == PriorityLevel::Critical
        {
            Lane::Critical
        } else {
            Lane::Batch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{Event, NetworkStatus};
    use beacon_priority::score_event;
    use proptest::prelude::*;

    fn priority(importance: f64, battery: f64, network: NetworkStatus) -> Priority {
        score_event(&Event::new("cfg", importance, battery, network))
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.critical_threshold, 7.5);
        assert_eq!(config.batch_interval, Duration::from_millis(5000));
        assert_eq!(config.max_batch_size, 10);
        assert!(config.validate().is_ok());
        assert!(SchedulerConfig::low_power().validate().is_ok());
        assert!(SchedulerConfig::responsive().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_cadence() {
        let zero_interval = SchedulerConfig::default().with_batch_interval(Duration::ZERO);
        assert!(matches!(
            zero_interval.validate(),
            Err(BeaconError::InvalidConfig(_))
        ));

        let zero_size = SchedulerConfig::default().with_max_batch_size(0);
        assert!(zero_size.validate().is_err());

        assert!(SchedulerConfig::default()
            .with_critical_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(SchedulerConfig::default()
            .with_critical_threshold(11.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_route_by_threshold() {
        let config = SchedulerConfig::default();
        // 9 / 15% / good -> 8.65
        assert_eq!(config.route(&priority(9.0, 15.0, NetworkStatus::Good)), Lane::Critical);
        // 2 / 90% / excellent -> 3.30
        assert_eq!(config.route(&priority(2.0, 90.0, NetworkStatus::Excellent)), Lane::Batch);
        // 8 / 30% / fair -> 7.10, high but under threshold
        assert_eq!(config.route(&priority(8.0, 30.0, NetworkStatus::Fair)), Lane::Batch);
        // 9 / 30% / fair -> 7.60, high and over threshold
        assert_eq!(config.route(&priority(9.0, 30.0, NetworkStatus::Fair)), Lane::Critical);
    }

    #[test]
    fn test_route_level_overrides_raised_threshold() {
        let config = SchedulerConfig::default().with_critical_threshold(9.5);
        let p = priority(9.0, 15.0, NetworkStatus::Good);
        assert_eq!(p.level, PriorityLevel::Critical);
        assert_eq!(config.route(&p), Lane::Critical);
    }

    #[test]
    fn test_config_serializes_millis() {
        let json = serde_json::to_value(SchedulerConfig::default()).unwrap();
        assert_eq!(json["batchIntervalMs"], 5000);
        assert_eq!(json["maxBatchSize"], 10);
        assert_eq!(json["criticalThreshold"], 7.5);
    }

    proptest! {
        #[test]
        fn prop_route_follows_threshold_or_level(
            importance in 0.0f64..=10.0,
            battery in 0.0f64..=100.0,
            threshold in 0.0f64..=10.0,
        ) {
            let config = SchedulerConfig::default().with_critical_threshold(threshold);
            let p = priority(importance, battery, NetworkStatus::Good);
            let lane = config.route(&p);
            if p.level == PriorityLevel::Critical || p.score.as_f64() >= threshold {
                prop_assert_eq!(lane, Lane::Critical);
            } else {
                prop_assert_eq!(lane, Lane::Batch);
            }
        }
    }
}
