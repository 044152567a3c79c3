//! Error types for the dispatch pipeline

use thiserror::Error;

use crate::{EntryId, NodeId, RecordId};

/// Core Beacon errors
#[derive(Error, Debug)]
pub enum BeaconError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },

    #[error("No async runtime available to drive the batch timer")]
    NoRuntime,

    // Dispatch errors
    #[error("Upload failed for {entry} from {node}: {reason}")]
    UploadFailed {
        entry: EntryId,
        /// Store record of the originating event, when it came through the store
        record: Option<RecordId>,
        node: NodeId,
        reason: String,
    },

    // Store errors
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),
}

/// Result type for Beacon operations
pub type BeaconResult<T> = Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BeaconError::UploadFailed {
            entry: EntryId::new(3),
            record: Some(RecordId::new(12)),
            node: NodeId::from("n-9"),
            reason: "link down".into(),
        };
        assert_eq!(err.to_string(), "Upload failed for entry-3 from n-9: link down");

        let err = BeaconError::InvalidConfig("max_batch_size must be positive".into());
        assert!(err.to_string().contains("max_batch_size"));
    }
}
