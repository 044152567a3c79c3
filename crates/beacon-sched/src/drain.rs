//! Drain results

use chrono::{DateTime, Utc};
use serde::Serialize;

use beacon_core::{BeaconError, EntryId, NodeId, PriorityLevel, RecordId, Score, Scored};

use crate::{Lane, QueueEntry, UploadError};

/// An entry handed to the uploader successfully
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub entry: EntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
    pub node_id: NodeId,
    pub score: Score,
    pub level: PriorityLevel,
    pub lane: Lane,
    pub enqueued_at: DateTime<Utc>,
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchRecord {
    pub(crate) fn from_entry(entry: &QueueEntry) -> Self {
        DispatchRecord {
            entry: entry.id,
            record: entry.record,
            node_id: entry.event.node_id.clone(),
            score: entry.priority.score,
            level: entry.priority.level,
            lane: entry.lane,
            enqueued_at: entry.enqueued_at,
            dispatched_at: Utc::now(),
        }
    }
}

impl Scored for DispatchRecord {
    fn score(&self) -> Score {
        self.score
    }
}

/// An entry whose upload failed. It has already left its lane.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchFailure {
    pub entry: EntryId,
    pub record: Option<RecordId>,
    pub node_id: NodeId,
    pub score: Score,
    pub lane: Lane,
    pub reason: UploadError,
    pub failed_at: DateTime<Utc>,
}

impl DispatchFailure {
    pub(crate) fn from_entry(entry: &QueueEntry, reason: UploadError) -> Self {
        DispatchFailure {
            entry: entry.id,
            record: entry.record,
            node_id: entry.event.node_id.clone(),
            score: entry.priority.score,
            lane: entry.lane,
            reason,
            failed_at: Utc::now(),
        }
    }

    pub fn to_error(&self) -> BeaconError {
        BeaconError::UploadFailed {
            entry: self.entry,
            record: self.record,
            node: self.node_id.clone(),
            reason: self.reason.to_string(),
        }
    }
}

/// Outcome of one drain operation
#[derive(Clone, Debug, PartialEq)]
pub struct DrainReport {
    pub lane: Lane,
    /// Successful uploads, in the order they were attempted
    pub dispatched: Vec<DispatchRecord>,
    pub failures: Vec<DispatchFailure>,
    /// Every drained entry in attempt order, successful or not
    pub order: Vec<EntryId>,
}

impl DrainReport {
    pub(crate) fn empty(lane: Lane) -> Self {
        DrainReport {
            lane,
            dispatched: Vec::new(),
            failures: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Number of entries removed from the lane
    pub fn attempted(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}
