//! Runtime configuration
//!
//! Values come from `BEACON_*` environment variables layered over defaults.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use beacon_core::{BeaconError, BeaconResult};
use beacon_sched::SchedulerConfig;

pub const ENV_CRITICAL_THRESHOLD: &str = "BEACON_CRITICAL_THRESHOLD";
pub const ENV_BATCH_INTERVAL: &str = "BEACON_BATCH_INTERVAL";
pub const ENV_MAX_BATCH_SIZE: &str = "BEACON_MAX_BATCH_SIZE";
pub const ENV_LOG_FORMAT: &str = "BEACON_LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "BEACON_LOG_FILTER";

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected plain or json, got {}", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plain => f.write_str("plain"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            format: LogFormat::Plain,
            filter: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Everything a gateway process needs to start
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RuntimeConfig {
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> BeaconResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `BEACON_*` key.
    /// Empty values count as unset. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> BeaconResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = RuntimeConfig::default();

        if let Some(value) = get(ENV_CRITICAL_THRESHOLD) {
            config.scheduler.critical_threshold = parse_env(ENV_CRITICAL_THRESHOLD, &value)?;
        }
        if let Some(value) = get(ENV_BATCH_INTERVAL) {
            config.scheduler.batch_interval = humantime::parse_duration(value.trim())
                .map_err(|e| invalid_env(ENV_BATCH_INTERVAL, &value, e))?;
        }
        if let Some(value) = get(ENV_MAX_BATCH_SIZE) {
            config.scheduler.max_batch_size = parse_env(ENV_MAX_BATCH_SIZE, &value)?;
        }
        if let Some(value) = get(ENV_LOG_FORMAT) {
            config.logging.format = parse_env(ENV_LOG_FORMAT, &value)?;
        }
        if let Some(value) = get(ENV_LOG_FILTER) {
            config.logging.filter = value.trim().to_string();
        }

        config.scheduler.validate()?;
        Ok(config)
    }
}

fn parse_env<T>(key: &str, value: &str) -> BeaconResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e| invalid_env(key, value, e))
}

fn invalid_env(key: &str, value: &str, reason: impl fmt::Display) -> BeaconError {
    BeaconError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = RuntimeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.scheduler.critical_threshold, 7.5);
        assert_eq!(config.scheduler.batch_interval, Duration::from_secs(5));
        assert_eq!(config.scheduler.max_batch_size, 10);
        assert_eq!(config.logging.format, LogFormat::Plain);
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (ENV_CRITICAL_THRESHOLD, "8.0"),
            (ENV_BATCH_INTERVAL, "250ms"),
            (ENV_MAX_BATCH_SIZE, " 25 "),
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_LOG_FILTER, "beacon_sched=debug"),
        ]))
        .unwrap();

        assert_eq!(config.scheduler.critical_threshold, 8.0);
        assert_eq!(config.scheduler.batch_interval, Duration::from_millis(250));
        assert_eq!(config.scheduler.max_batch_size, 25);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "beacon_sched=debug");
    }

    #[test]
    fn test_compound_interval() {
        let config =
            RuntimeConfig::from_lookup(lookup_from(&[(ENV_BATCH_INTERVAL, "1m 30s")])).unwrap();
        assert_eq!(config.scheduler.batch_interval, Duration::from_secs(90));
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config =
            RuntimeConfig::from_lookup(lookup_from(&[(ENV_MAX_BATCH_SIZE, "")])).unwrap();
        assert_eq!(config.scheduler.max_batch_size, 10);
    }

    #[test]
    fn test_malformed_values() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_BATCH_INTERVAL, "soon")]))
            .unwrap_err();
        match err {
            BeaconError::InvalidEnv { key, value, .. } => {
                assert_eq!(key, ENV_BATCH_INTERVAL);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {}", other),
        }

        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_MAX_BATCH_SIZE, "-3")]))
            .unwrap_err();
        assert!(matches!(err, BeaconError::InvalidEnv { .. }));

        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_LOG_FORMAT, "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected plain or json"));
    }

    #[test]
    fn test_parsed_values_are_validated() {
        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_MAX_BATCH_SIZE, "0")]))
            .unwrap_err();
        assert!(matches!(err, BeaconError::InvalidConfig(_)));

        let err = RuntimeConfig::from_lookup(lookup_from(&[(ENV_CRITICAL_THRESHOLD, "11")]))
            .unwrap_err();
        assert!(matches!(err, BeaconError::InvalidConfig(_)));
    }
}
