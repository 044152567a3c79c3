//! Stored event record

use chrono::{DateTime, Utc};
use serde::Serialize;

use beacon_core::{Event, NodeId, Priority, PriorityLevel, RecordId, Score, Scored};

/// An accepted event together with its priority
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: RecordId,
    #[serde(flatten)]
    pub event: Event,
    pub priority: Priority,
    pub stored_at: DateTime<Utc>,
}

impl StoredEvent {
    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.event.node_id
    }

    #[inline]
    pub fn level(&self) -> PriorityLevel {
        self.priority.level
    }
}

impl Scored for StoredEvent {
    fn score(&self) -> Score {
        self.priority.score
    }
}
