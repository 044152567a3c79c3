//! Beacon Store - Priority-ordered collection of accepted events
//!
//! This crate provides:
//! - Stable descending-score insertion
//! - Filtered, re-sortable, paginated queries
//! - Per-level statistics

pub mod record;
pub mod query;
pub mod stats;
pub mod store;

pub use record::*;
pub use query::*;
pub use stats::*;
pub use store::*;
