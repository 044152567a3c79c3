//! Store queries

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use beacon_core::{NodeId, PriorityLevel, Score};

use crate::StoredEvent;

/// Result ordering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Score descending, ties in arrival order
    #[default]
    Priority,
    /// Source timestamp descending, newest first
    Recency,
}

/// Filter, ordering and pagination for [`crate::PriorityStore::query`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub node_id: Option<NodeId>,
    pub sensor_type: Option<String>,
    pub level: Option<PriorityLevel>,
    /// Inclusive lower bound on score
    pub min_score: Option<Score>,
    pub sort: SortOrder,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    /// Unfiltered query in priority order
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node_id: impl Into<NodeId>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn sensor_type(mut self, sensor_type: impl Into<String>) -> Self {
        self.sensor_type = Some(sensor_type.into());
        self
    }

    pub fn level(mut self, level: PriorityLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn min_score(mut self, score: Score) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Does a record pass every filter?
    pub fn matches(&self, record: &StoredEvent) -> bool {
        if let Some(node_id) = &self.node_id {
            if record.node_id() != node_id {
                return false;
            }
        }
        if let Some(sensor_type) = &self.sensor_type {
            if record.event.sensor_type.as_deref() != Some(sensor_type.as_str()) {
                return false;
            }
        }
        if let Some(level) = self.level {
            if record.level() != level {
                return false;
            }
        }
        if let Some(min_score) = self.min_score {
            if record.priority.score < min_score {
                return false;
            }
        }
        true
    }
}

/// One page of query results
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub items: Vec<Arc<StoredEvent>>,
    /// Matches before pagination
    pub total: usize,
}

impl Page {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
