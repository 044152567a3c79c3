//! Beacon Priority - Event urgency scoring
//!
//! Converts the three urgency attributes of an event into a single score:
//! - Importance (weight 0.5)
//! - Battery depletion (weight 0.3)
//! - Network quality (weight 0.2)
//!
//! Scoring is pure and never fails; out-of-domain inputs are clamped.

pub mod scorer;
pub mod order;

pub use scorer::*;
pub use order::*;
