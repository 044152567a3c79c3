//! Ingest pipeline
//!
//! score -> store -> schedule, in that order, for every accepted event.

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::debug;

use beacon_core::{BeaconResult, Event};
use beacon_priority::score_event;
use beacon_sched::{DrainReport, Placement, QueueStatus, Scheduler, SchedulerConfig, Uploader};
use beacon_store::{PriorityStats, PriorityStore, StoredEvent};

use crate::RuntimeConfig;

/// Result of accepting one event
#[derive(Clone, Debug)]
pub struct IngestOutcome {
    /// The store's copy, including the computed priority
    pub record: Arc<StoredEvent>,
    pub placement: Placement,
}

/// Combined view for status endpoints
#[derive(Clone, Debug, Serialize)]
pub struct PipelineStatus {
    pub queues: QueueStatus,
    pub store: PriorityStats,
}

/// Scorer, store and scheduler wired together
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<PriorityStore>,
    scheduler: Scheduler,
}

impl Pipeline {
    /// Build on the current runtime with a fresh store
    pub fn new<U: Uploader>(config: SchedulerConfig, uploader: U) -> BeaconResult<Self> {
        let scheduler = Scheduler::with_config(config, uploader)?;
        Ok(Self::with_parts(Arc::new(PriorityStore::new()), scheduler))
    }

    pub fn from_config<U: Uploader>(config: &RuntimeConfig, uploader: U) -> BeaconResult<Self> {
        Self::new(config.scheduler.clone(), uploader)
    }

    /// Build with the batch timer on `runtime`, for callers outside it
    pub fn with_runtime<U: Uploader>(
        config: SchedulerConfig,
        uploader: U,
        runtime: Handle,
    ) -> BeaconResult<Self> {
        let scheduler = Scheduler::with_runtime(config, uploader, runtime)?;
        Ok(Self::with_parts(Arc::new(PriorityStore::new()), scheduler))
    }

    pub fn with_parts(store: Arc<PriorityStore>, scheduler: Scheduler) -> Self {
        Pipeline { store, scheduler }
    }

    /// Accept an event.
    ///
    /// The event is recorded in the store before it is scheduled, so the
    /// store holds every accepted event whatever its upload outcome.
    pub fn ingest(&self, event: Event) -> IngestOutcome {
        let priority = score_event(&event);
        let record = self.store.insert(event.clone(), priority.clone());
        let placement = self.scheduler.submit_record(record.id, event, priority);

        debug!(
            record = %record.id,
            entry = %placement.entry,
            lane = %placement.lane,
            "event ingested"
        );

        IngestOutcome { record, placement }
    }

    pub fn ingest_all<I>(&self, events: I) -> Vec<IngestOutcome>
    where
        I: IntoIterator<Item = Event>,
    {
        events.into_iter().map(|event| self.ingest(event)).collect()
    }

    pub fn store(&self) -> &Arc<PriorityStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            queues: self.scheduler.status(),
            store: self.store.statistics(),
        }
    }

    /// Flush both lanes and stop the batch timer. The store is kept.
    pub fn shutdown(&self) -> Vec<DrainReport> {
        self.scheduler.shutdown()
    }
}
