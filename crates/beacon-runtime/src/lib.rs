//! Beacon Runtime - Wiring for a running gateway
//!
//! Scores accepted events, records them in the store and hands them to the
//! scheduler. Also owns environment configuration and logging setup.

pub mod config;
pub mod telemetry;
pub mod pipeline;

pub use config::*;
pub use telemetry::*;
pub use pipeline::*;

pub use beacon_core as core;
pub use beacon_priority as priority;
pub use beacon_sched as sched;
pub use beacon_store as store;
