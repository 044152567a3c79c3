//! Lanes and queue entries

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use beacon_core::{EntryId, Event, NodeId, Priority, PriorityLevel, RecordId, Score, Scored};

/// Queue discipline inside the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// Preemptive: drained synchronously on every submission
    Critical,
    /// Periodic: drained by the batch timer
    Batch,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Critical => "critical",
            Lane::Batch => "batch",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event waiting in a lane. Owned by the scheduler until drained.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueEntry {
    pub id: EntryId,
    /// Store record this event was accepted as, when known
    pub record: Option<RecordId>,
    pub event: Event,
    pub priority: Priority,
    pub lane: Lane,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.event.node_id
    }

    #[inline]
    pub fn level(&self) -> PriorityLevel {
        self.priority.level
    }

    /// Compact view for status reporting
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            entry: self.id,
            record: self.record,
            node_id: self.event.node_id.clone(),
            score: self.priority.score,
            level: self.priority.level,
            enqueued_at: self.enqueued_at,
        }
    }
}

impl Scored for QueueEntry {
    fn score(&self) -> Score {
        self.priority.score
    }
}

/// Per-item line of a queue status report
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub entry: EntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
    pub node_id: NodeId,
    pub score: Score,
    pub level: PriorityLevel,
    pub enqueued_at: DateTime<Utc>,
}
