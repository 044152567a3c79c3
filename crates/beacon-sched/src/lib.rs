//! Beacon Scheduler - Dual-discipline dispatch of scored events
//!
//! Every submitted event lands in one of two lanes:
//! - Critical: drained immediately and synchronously on submission
//! - Batch: drained by a recurring timer, up to a fixed batch size per tick
//!
//! Drains hand items to an [`Uploader`] in non-increasing score order.
//! Upload failures are reported per item and never re-enter a lane.

pub mod config;
pub mod lane;
pub mod drain;
pub mod uploader;
pub mod status;
pub mod scheduler;

pub use config::*;
pub use lane::*;
pub use drain::*;
pub use uploader::*;
pub use status::*;
pub use scheduler::*;
