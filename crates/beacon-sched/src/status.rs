//! Scheduler introspection

use serde::Serialize;

use crate::{EntrySummary, SchedulerConfig};

/// Cumulative scheduler counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub submitted: u64,
    pub critical_routed: u64,
    pub batch_routed: u64,
    pub dispatched: u64,
    pub failed: u64,
    pub critical_drains: u64,
    pub batch_drains: u64,
    pub timer_starts: u64,
    pub timer_stops: u64,
}

/// Snapshot of one lane
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LaneStatus {
    pub count: usize,
    pub items: Vec<EntrySummary>,
}

/// Read-only view for status endpoints
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub critical: LaneStatus,
    pub batch: LaneStatus,
    pub timer_running: bool,
    pub config: SchedulerConfig,
    pub stats: SchedulerStats,
}

impl QueueStatus {
    pub fn critical_count(&self) -> usize {
        self.critical.count
    }

    pub fn batch_count(&self) -> usize {
        self.batch.count
    }
}
