//! Beacon Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every stage of the dispatch pipeline:
//! - Identifiers (NodeId, RecordId)
//! - Telemetry events and the network quality tag
//! - Priority scores, levels and their breakdown
//! - Error types

pub mod id;
pub mod event;
pub mod priority;
pub mod error;

pub use id::*;
pub use event::*;
pub use priority::*;
pub use error::*;
