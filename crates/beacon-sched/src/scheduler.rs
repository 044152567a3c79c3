//! Dispatch scheduler
//!
//! Each lane has its own lock, held only while entries move in or out of it.
//! The uploader is always called with no lock held.
//! Lock order when nesting: timer slot, then a lane.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use beacon_core::{
    BeaconError, BeaconResult, EntryId, Event, Priority, PriorityLevel, RecordId, Score,
};
use beacon_priority::sort_by_priority;

use crate::{
    DispatchFailure, DispatchRecord, DrainReport, Lane, LaneStatus, QueueEntry, QueueStatus,
    SchedulerConfig, SchedulerStats, Uploader,
};

/// Buffered failures per subscriber before the oldest are dropped
pub const FAILURE_CHANNEL_CAPACITY: usize = 256;

/// Where a submission went
#[derive(Clone, Debug)]
pub struct Placement {
    pub entry: EntryId,
    pub lane: Lane,
    pub score: Score,
    pub level: PriorityLevel,
    /// The synchronous drain a critical submission triggered
    pub drain: Option<DrainReport>,
}

#[derive(Default)]
struct TimerSlot {
    /// Bumped on every start so a cancelled timer cannot act on a newer one
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    config: SchedulerConfig,
    uploader: Arc<dyn Uploader>,
    critical: Mutex<VecDeque<QueueEntry>>,
    batch: Mutex<VecDeque<QueueEntry>>,
    timer: Mutex<TimerSlot>,
    /// A size-triggered drain is scheduled or running
    size_drain_pending: AtomicBool,
    stats: Mutex<SchedulerStats>,
    last_entry: AtomicU64,
    failures: broadcast::Sender<DispatchFailure>,
    runtime: Handle,
}

/// Dual-lane dispatch scheduler. Cheap to clone; clones share lanes and timer.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a scheduler with default configuration on the current runtime
    pub fn new<U: Uploader>(uploader: U) -> BeaconResult<Self> {
        Self::with_config(SchedulerConfig::default(), uploader)
    }

    /// Create a scheduler on the current runtime
    pub fn with_config<U: Uploader>(config: SchedulerConfig, uploader: U) -> BeaconResult<Self> {
        let runtime = Handle::try_current().map_err(|_| BeaconError::NoRuntime)?;
        Self::with_runtime(config, uploader, runtime)
    }

    /// Create a scheduler whose batch timer runs on `runtime`
    pub fn with_runtime<U: Uploader>(
        config: SchedulerConfig,
        uploader: U,
        runtime: Handle,
    ) -> BeaconResult<Self> {
        config.validate()?;

        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        let uploader: Arc<dyn Uploader> = Arc::new(uploader);

        info!(
            critical_threshold = config.critical_threshold,
            batch_interval_ms = config.batch_interval.as_millis() as u64,
            max_batch_size = config.max_batch_size,
            "scheduler created"
        );

        Ok(Scheduler {
            shared: Arc::new(Shared {
                config,
                uploader,
                critical: Mutex::new(VecDeque::new()),
                batch: Mutex::new(VecDeque::new()),
                timer: Mutex::new(TimerSlot::default()),
                size_drain_pending: AtomicBool::new(false),
                stats: Mutex::new(SchedulerStats::default()),
                last_entry: AtomicU64::new(0),
                failures,
                runtime,
            }),
        })
    }

    /// Queue a scored event.
    ///
    /// Critical placements are drained before this returns. Batch placements
    /// return immediately and are drained by the timer, or early once the
    /// lane holds a full batch.
    pub fn submit(&self, event: Event, priority: Priority) -> Placement {
        self.shared.enqueue(None, event, priority)
    }

    /// Like [`Scheduler::submit`], tagging the entry with its store record
    pub fn submit_record(&self, record: RecordId, event: Event, priority: Priority) -> Placement {
        self.shared.enqueue(Some(record), event, priority)
    }

    /// Drain the whole critical lane now
    pub fn drain_critical(&self) -> DrainReport {
        self.shared.drain_critical()
    }

    /// Drain one batch now, without waiting for the timer
    pub fn drain_batch(&self) -> DrainReport {
        let items = self.shared.take_batch();
        let report = self.shared.dispatch(Lane::Batch, items);
        self.shared.stop_timer_if_idle();
        report
    }

    /// Failures from every drain, including timer-driven ones
    pub fn subscribe_failures(&self) -> broadcast::Receiver<DispatchFailure> {
        self.shared.failures.subscribe()
    }

    pub fn status(&self) -> QueueStatus {
        let critical = lane_status(&self.shared.critical.lock());
        let batch = lane_status(&self.shared.batch.lock());
        QueueStatus {
            critical,
            batch,
            timer_running: self.is_timer_running(),
            config: self.shared.config.clone(),
            stats: self.stats(),
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.shared.stats.lock().clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    pub fn is_timer_running(&self) -> bool {
        self.shared.timer.lock().handle.is_some()
    }

    /// Cancel the batch timer. Returns false if it was not running.
    /// The next batch submission starts a new one.
    pub fn stop_batch_timer(&self) -> bool {
        let mut slot = self.shared.timer.lock();
        self.shared.cancel_timer(&mut slot)
    }

    /// Cancel the timer and discard both lanes. Returns the number of entries dropped.
    pub fn clear_queues(&self) -> usize {
        let mut slot = self.shared.timer.lock();
        self.shared.cancel_timer(&mut slot);

        let discarded = {
            let mut critical = self.shared.critical.lock();
            let n = critical.len();
            critical.clear();
            n
        } + {
            let mut batch = self.shared.batch.lock();
            let n = batch.len();
            batch.clear();
            n
        };
        drop(slot);

        info!(discarded, "queues cleared");
        discarded
    }

    /// Cancel the timer and drain both lanes to empty on the calling thread
    pub fn shutdown(&self) -> Vec<DrainReport> {
        self.stop_batch_timer();

        let mut reports = Vec::new();
        let critical = self.shared.drain_critical();
        if !critical.is_empty() {
            reports.push(critical);
        }
        loop {
            let items = self.shared.take_batch();
            if items.is_empty() {
                break;
            }
            reports.push(self.shared.dispatch(Lane::Batch, items));
        }

        info!(drains = reports.len(), "scheduler shut down");
        reports
    }
}

fn lane_status(lane: &VecDeque<QueueEntry>) -> LaneStatus {
    LaneStatus {
        count: lane.len(),
        items: lane.iter().map(QueueEntry::summary).collect(),
    }
}

impl Shared {
    fn enqueue(
        self: &Arc<Self>,
        record: Option<RecordId>,
        event: Event,
        priority: Priority,
    ) -> Placement {
        let lane = self.config.route(&priority);
        let id = EntryId::new(self.last_entry.fetch_add(1, Ordering::Relaxed) + 1);
        let (score, level) = (priority.score, priority.level);

        {
            let mut stats = self.stats.lock();
            stats.submitted += 1;
            match lane {
                Lane::Critical => stats.critical_routed += 1,
                Lane::Batch => stats.batch_routed += 1,
            }
        }

        debug!(
            entry = %id,
            node = %event.node_id,
            score = %score,
            level = %level,
            lane = %lane,
            "event queued"
        );

        let entry = QueueEntry {
            id,
            record,
            event,
            priority,
            lane,
            enqueued_at: Utc::now(),
        };

        let drain = match lane {
            Lane::Critical => {
                self.critical.lock().push_back(entry);
                Some(self.drain_critical())
            }
            Lane::Batch => {
                let queued = {
                    let mut batch = self.batch.lock();
                    batch.push_back(entry);
                    batch.len()
                };
                self.ensure_timer();
                if queued >= self.config.max_batch_size {
                    self.spawn_size_drain();
                }
                None
            }
        };

        Placement {
            entry: id,
            lane,
            score,
            level,
            drain,
        }
    }

    fn drain_critical(&self) -> DrainReport {
        let items: Vec<QueueEntry> = self.critical.lock().drain(..).collect();
        self.dispatch(Lane::Critical, items)
    }

    /// Oldest entries of the batch lane, at most one batch
    fn take_batch(&self) -> Vec<QueueEntry> {
        let mut batch = self.batch.lock();
        let n = batch.len().min(self.config.max_batch_size);
        batch.drain(..n).collect()
    }

    fn take_full_batch(&self) -> Option<Vec<QueueEntry>> {
        let mut batch = self.batch.lock();
        if batch.len() < self.config.max_batch_size {
            return None;
        }
        Some(batch.drain(..self.config.max_batch_size).collect())
    }

    /// Hand drained entries to the uploader, highest score first.
    /// A failed upload is reported and skipped; the rest still go out.
    fn dispatch(&self, lane: Lane, mut items: Vec<QueueEntry>) -> DrainReport {
        let mut report = DrainReport::empty(lane);
        if items.is_empty() {
            return report;
        }

        sort_by_priority(&mut items);
        info!(
            lane = %lane,
            count = items.len(),
            top_score = %items[0].priority.score,
            "draining lane"
        );

        for entry in &items {
            report.order.push(entry.id);
            match self.uploader.upload(entry) {
                Ok(()) => {
                    debug!(
                        entry = %entry.id,
                        node = %entry.node_id(),
                        score = %entry.priority.score,
                        level = %entry.level(),
                        "dispatched"
                    );
                    report.dispatched.push(DispatchRecord::from_entry(entry));
                }
                Err(reason) => {
                    warn!(
                        entry = %entry.id,
                        node = %entry.event.node_id,
                        lane = %lane,
                        error = %reason,
                        "upload failed"
                    );
                    let failure = DispatchFailure::from_entry(entry, reason);
                    // No subscribers is fine
                    let _ = self.failures.send(failure.clone());
                    report.failures.push(failure);
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.dispatched += report.dispatched.len() as u64;
        stats.failed += report.failures.len() as u64;
        match lane {
            Lane::Critical => stats.critical_drains += 1,
            Lane::Batch => stats.batch_drains += 1,
        }

        report
    }

    /// Start the batch timer unless one is already running
    fn ensure_timer(self: &Arc<Self>) {
        let mut slot = self.timer.lock();
        if slot.handle.is_some() {
            return;
        }

        slot.generation += 1;
        let generation = slot.generation;
        let period = self.config.batch_interval;
        slot.handle = Some(self.runtime.spawn(run_batch_timer(
            Arc::downgrade(self),
            generation,
            period,
        )));
        drop(slot);

        self.stats.lock().timer_starts += 1;
        info!(
            generation,
            interval_ms = period.as_millis() as u64,
            "batch timer started"
        );
    }

    /// Take the batch for one tick of timer `generation`.
    /// `None` if that timer has been cancelled or replaced; otherwise the
    /// items plus whether the timer keeps running.
    fn on_timer_tick(&self, generation: u64) -> Option<(Vec<QueueEntry>, bool)> {
        let mut slot = self.timer.lock();
        if slot.generation != generation || slot.handle.is_none() {
            return None;
        }

        let (items, remaining) = {
            let mut batch = self.batch.lock();
            let n = batch.len().min(self.config.max_batch_size);
            let items: Vec<QueueEntry> = batch.drain(..n).collect();
            (items, batch.len())
        };

        if remaining > 0 {
            return Some((items, true));
        }

        // Lane is empty: detach our own handle and finish after this drain
        slot.handle = None;
        drop(slot);
        self.stats.lock().timer_stops += 1;
        info!(generation, "batch timer stopped");
        Some((items, false))
    }

    fn cancel_timer(&self, slot: &mut TimerSlot) -> bool {
        match slot.handle.take() {
            Some(handle) => {
                handle.abort();
                self.stats.lock().timer_stops += 1;
                info!(generation = slot.generation, "batch timer stopped");
                true
            }
            None => false,
        }
    }

    fn stop_timer_if_idle(&self) {
        let mut slot = self.timer.lock();
        if slot.handle.is_none() || !self.batch.lock().is_empty() {
            return;
        }
        self.cancel_timer(&mut slot);
    }

    /// Drain full batches off the timer's schedule. The timer keeps running;
    /// its next tick stops it if the lane is still empty.
    fn spawn_size_drain(self: &Arc<Self>) {
        if self.size_drain_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(max_batch_size = self.config.max_batch_size, "batch lane full");
        let shared = Arc::clone(self);
        self.runtime.spawn_blocking(move || shared.drain_full_batches());
    }

    fn drain_full_batches(&self) {
        loop {
            while let Some(items) = self.take_full_batch() {
                self.dispatch(Lane::Batch, items);
            }
            self.size_drain_pending.store(false, Ordering::Release);

            // A submission may have filled the lane after the last check
            let full = self.batch.lock().len() >= self.config.max_batch_size;
            if !full || self.size_drain_pending.swap(true, Ordering::AcqRel) {
                break;
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().handle.take() {
            handle.abort();
        }
    }
}

async fn run_batch_timer(shared: Weak<Shared>, generation: u64, period: Duration) {
    // First drain one full period after start
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let Some((items, keep_running)) = shared.on_timer_tick(generation) else {
            break;
        };

        if !items.is_empty() {
            let worker = Arc::clone(&shared);
            let drained =
                tokio::task::spawn_blocking(move || worker.dispatch(Lane::Batch, items)).await;
            if let Err(e) = drained {
                warn!(error = %e, "batch drain task failed");
            }
        }

        if !keep_running {
            break;
        }
    }
}
