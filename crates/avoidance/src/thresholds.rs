//! Distance cutoffs for obstacle presence

use crate::DecisionError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Near-field and far-field distance cutoffs in depth units.
///
/// Bottom regions count samples closer than `low`, top regions count samples
/// closer than `high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    low: u16,
    high: u16,
}

impl Thresholds {
    /// Validate and build a threshold pair
    pub fn new(low: u16, high: u16) -> Result<Self, DecisionError> {
        if low == 0 {
            return Err(DecisionError::InvalidThreshold { name: "low" });
        }
        if high == 0 {
            return Err(DecisionError::InvalidThreshold { name: "high" });
        }
        if low >= high {
            warn!("Near-field threshold {} is not below far-field threshold {}", low, high);
        }
        Ok(Self { low, high })
    }

    /// Near-field cutoff (bottom regions)
    pub fn low(&self) -> u16 {
        self.low
    }

    /// Far-field cutoff (top regions)
    pub fn high(&self) -> u16 {
        self.high
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { low: 400, high: 700 }
    }
}
