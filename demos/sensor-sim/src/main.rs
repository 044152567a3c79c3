//! Beacon Sensor Simulator
//!
//! Runs a synthetic fleet through the full ingest pipeline:
//! - Random battery, network and importance per node (seeded)
//! - Critical readings uploaded immediately, the rest batched
//! - A lossy uplink whose drop rate follows each node's network status
//!
//! Usage: sensor-sim [nodes] [events-per-node] [seed] [pace-ms]
//! Scheduler and logging settings come from `BEACON_*` variables.

mod fleet;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use beacon_core::PriorityLevel;
use beacon_runtime::{init_logging, Pipeline, RuntimeConfig};
use beacon_sched::{FnUploader, Lane, QueueEntry, UploadError};

use fleet::{loss_rate, Fleet};

struct SimArgs {
    nodes: usize,
    events_per_node: usize,
    seed: u64,
    pace: Duration,
}

impl SimArgs {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_args(&args)
    }

    fn from_args(args: &[String]) -> Result<Self, String> {
        Ok(SimArgs {
            nodes: arg_or(args, 0, "nodes", 8)?,
            events_per_node: arg_or(args, 1, "events-per-node", 20)?,
            seed: arg_or(args, 2, "seed", 42)?,
            pace: Duration::from_millis(arg_or(args, 3, "pace-ms", 50)?),
        })
    }
}

/// Positional argument `index`, or `default` when absent
fn arg_or<T>(args: &[String], index: usize, name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match args.get(index) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("invalid <{}> argument {:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SimArgs::parse()?;
    let config = RuntimeConfig::from_env()?;
    init_logging(&config.logging);

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           Beacon Sensor Simulator                          ║");
    println!("║     Priority scoring and dual-lane dispatch                ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Fleet: {} nodes x {} events, seed {}, pace {:?}",
        args.nodes, args.events_per_node, args.seed, args.pace
    );
    println!(
        "Scheduler: threshold {:.2}, batch every {:?}, up to {} per batch",
        config.scheduler.critical_threshold,
        config.scheduler.batch_interval,
        config.scheduler.max_batch_size
    );
    println!();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut fleet = Fleet::new(args.nodes, &mut rng);

    let uplink_rng = Arc::new(Mutex::new(StdRng::seed_from_u64(args.seed.wrapping_add(1))));
    let uploader = FnUploader(move |entry: &QueueEntry| {
        let rate = loss_rate(entry.event.network_status);
        if uplink_rng.lock().gen_bool(rate) {
            Err(UploadError::Unavailable(format!(
                "packet lost on {} link",
                entry.event.network_status
            )))
        } else {
            Ok(())
        }
    });

    let pipeline = Pipeline::from_config(&config, uploader)?;

    let lost = Arc::new(AtomicUsize::new(0));
    let mut failures = pipeline.scheduler().subscribe_failures();
    let lost_counter = Arc::clone(&lost);
    let watcher = tokio::spawn(async move {
        loop {
            match failures.recv().await {
                Ok(failure) => {
                    lost_counter.fetch_add(1, Ordering::Relaxed);
                    warn!(entry = %failure.entry, node = %failure.node_id, "reading lost");
                }
                Err(RecvError::Lagged(skipped)) => {
                    lost_counter.fetch_add(skipped as usize, Ordering::Relaxed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let total = args.nodes * args.events_per_node;
    let mut critical = 0usize;
    for _ in 0..total {
        let Some(event) = fleet.next_event(&mut rng) else {
            break;
        };
        let outcome = pipeline.ingest(event);
        if outcome.placement.lane == Lane::Critical {
            critical += 1;
        }
        tokio::time::sleep(args.pace).await;
    }
    info!(ingested = total, critical, "fleet finished reporting");

    // Let one more batch tick pass, then flush whatever remains
    tokio::time::sleep(config.scheduler.batch_interval).await;
    let flushed: usize = pipeline.shutdown().iter().map(|r| r.attempted()).sum();

    let status = pipeline.status();
    // Dropping the last handle closes the failure channel
    drop(pipeline);
    if tokio::time::timeout(Duration::from_secs(1), watcher).await.is_err() {
        warn!("failure watcher did not finish");
    }

    println!("── Dispatch ─────────────────────────────────────────────────");
    println!("  Ingested:        {}", status.queues.stats.submitted);
    println!("  Critical lane:   {}", status.queues.stats.critical_routed);
    println!("  Batch lane:      {}", status.queues.stats.batch_routed);
    println!("  Uploaded:        {}", status.queues.stats.dispatched);
    println!("  Failed:          {}", status.queues.stats.failed);
    println!("  Flushed at exit: {}", flushed);
    println!("  Timer starts:    {}", status.queues.stats.timer_starts);
    println!("  Loss observed:   {}", lost.load(Ordering::Relaxed));
    println!();
    println!("── Store ────────────────────────────────────────────────────");
    println!("  Records:         {}", status.store.total);
    println!("  Average score:   {:.2}", status.store.average_score);
    if let Some(top) = status.store.top_score {
        println!("  Top score:       {}", top);
    }
    for level in PriorityLevel::ALL {
        println!(
            "  {:<9} {:>5} ({:.1}%)",
            level.as_str(),
            status.store.by_level.get(level),
            status.store.distribution.get(level)
        );
    }
    println!();

    Ok(())
}
