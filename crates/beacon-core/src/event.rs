//! Telemetry event definitions
//!
//! An event is a single reading reported by a node. The pipeline only
//! inspects the urgency attributes (importance, battery, network quality);
//! sensor payloads travel through untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Link quality reported by a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NetworkStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    /// Missing or unrecognized tag
    #[default]
    Unknown,
}

impl NetworkStatus {
    pub const ALL: [NetworkStatus; 6] = [
        NetworkStatus::Excellent,
        NetworkStatus::Good,
        NetworkStatus::Fair,
        NetworkStatus::Poor,
        NetworkStatus::Critical,
        NetworkStatus::Unknown,
    ];

    /// Parse a status tag. Case-insensitive; anything unrecognized is `Unknown`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "excellent" => NetworkStatus::Excellent,
            "good" => NetworkStatus::Good,
            "fair" => NetworkStatus::Fair,
            "poor" => NetworkStatus::Poor,
            "critical" => NetworkStatus::Critical,
            _ => NetworkStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkStatus::Excellent => "excellent",
            NetworkStatus::Good => "good",
            NetworkStatus::Fair => "fair",
            NetworkStatus::Poor => "poor",
            NetworkStatus::Critical => "critical",
            NetworkStatus::Unknown => "unknown",
        }
    }
}

impl From<String> for NetworkStatus {
    fn from(tag: String) -> Self {
        NetworkStatus::parse(&tag)
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A telemetry event as accepted by the pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Source device
    pub node_id: NodeId,
    /// Caller-declared urgency, nominally [0, 10]
    pub importance: f64,
    /// Battery percent remaining, nominally [0, 100]
    pub battery: f64,
    #[serde(default)]
    pub network_status: NetworkStatus,
    /// When the reading was taken at the source
    pub timestamp: DateTime<Utc>,
    /// When the event entered this system
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,
    /// Sensor readings, opaque to scoring and scheduling
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Event {
    /// Create an event read and received now
    pub fn new(
        node_id: impl Into<NodeId>,
        importance: f64,
        battery: f64,
        network_status: NetworkStatus,
    ) -> Self {
        let now = Utc::now();
        Event {
            node_id: node_id.into(),
            importance,
            battery,
            network_status,
            timestamp: now,
            received_at: now,
            sensor_type: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn with_sensor_type(mut self, sensor_type: impl Into<String>) -> Self {
        self.sensor_type = Some(sensor_type.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
