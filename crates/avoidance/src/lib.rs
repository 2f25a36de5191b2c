//! Reactive Obstacle Avoidance
//!
//! Classifies the free space in a depth frame into a steering verdict:
//! - Three vertical bands (left, center, right)
//! - Far-field (upper 3/4) and near-field (lower 1/4) regions per band
//! - Presence test against per-region distance thresholds

mod decision;
mod thresholds;

pub use decision::{assess, decide, BandReport, BandSums, DirectionVerdict};
pub use thresholds::Thresholds;

use thiserror::Error;

/// Decision error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("{name} threshold must be positive")]
    InvalidThreshold { name: &'static str },
}
