//! Identity types
//!
//! Node identifiers are opaque strings chosen by the devices themselves.
//! Record identifiers are assigned by the store on acceptance, entry
//! identifiers by the scheduler when an event is queued.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source device identity
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned record identity, unique and increasing per store
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const ZERO: RecordId = RecordId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        RecordId(self.0 + 1)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor-{}", self.0)
    }
}

/// Scheduler-assigned queue entry identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl EntryId {
    #[inline]
    pub fn new(id: u64) -> Self {
        EntryId(id)
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::new(7).to_string(), "sensor-7");
        assert_eq!(RecordId::ZERO.next(), RecordId::new(1));
    }

    #[test]
    fn test_node_id_conversions() {
        let a = NodeId::from("node-001");
        let b = NodeId::new(String::from("node-001"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "node-001");
        assert_eq!(format!("{:?}", a), "Node(node-001)");
    }
}
