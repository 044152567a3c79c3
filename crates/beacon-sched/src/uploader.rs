//! Uploader seam
//!
//! The scheduler decides order and urgency; an uploader performs the actual
//! transmission. The scheduler keeps no retry state, so uploads must be safe
//! to repeat if a caller retries a reported failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::QueueEntry;

/// Why a single upload failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Rejected by upstream: {0}")]
    Rejected(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),
}

/// Transmits one drained entry
pub trait Uploader: Send + Sync + 'static {
    /// Upload a single entry. Called once per drained item, in score order.
    fn upload(&self, entry: &QueueEntry) -> Result<(), UploadError>;
}

impl<U: Uploader + ?Sized> Uploader for Arc<U> {
    fn upload(&self, entry: &QueueEntry) -> Result<(), UploadError> {
        (**self).upload(entry)
    }
}

impl<U: Uploader + ?Sized> Uploader for Box<U> {
    fn upload(&self, entry: &QueueEntry) -> Result<(), UploadError> {
        (**self).upload(entry)
    }
}

/// Accepts everything; useful when only ordering matters
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopUploader;

impl Uploader for NoopUploader {
    fn upload(&self, entry: &QueueEntry) -> Result<(), UploadError> {
        debug!(
            entry = %entry.id,
            node = %entry.event.node_id,
            score = %entry.priority.score,
            "noop upload"
        );
        Ok(())
    }
}

/// Adapts a closure into an [`Uploader`]
pub struct FnUploader<F>(pub F);

impl<F> Uploader for FnUploader<F>
where
    F: Fn(&QueueEntry) -> Result<(), UploadError> + Send + Sync + 'static,
{
    fn upload(&self, entry: &QueueEntry) -> Result<(), UploadError> {
        (self.0)(entry)
    }
}
