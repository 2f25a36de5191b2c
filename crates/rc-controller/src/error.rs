//! Controller Error Types

use crate::ControllerState;
use avoidance::DecisionError;
use depth_sensor::SensorError;
use drive_control::ActuatorError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by controller lifecycle operations
#[derive(Debug, Error)]
pub enum ControlError {
    /// Operation not allowed in the current state
    #[error("Cannot {operation} while {from}")]
    InvalidTransition {
        from: ControllerState,
        operation: &'static str,
    },

    /// Sensor handle was lost (failed spawn); reset rebuilds it
    #[error("Depth sensor handle missing, reset the controller")]
    SensorMissing,

    /// Worker thread could not be created
    #[error("Failed to spawn control worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// Sensor could not be opened
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Actuator could not be opened
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// Rejected thresholds
    #[error("Invalid thresholds: {0}")]
    Decision(#[from] DecisionError),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Sensor failed to release during stop; the worker was still joined
    #[error("Sensor teardown failed: {0}")]
    Teardown(SensorError),
}

/// Fatal failure reported by the control worker before it exits
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum WorkerFault {
    /// Sensor stream broke mid-cycle
    #[error("sensor failure: {0}")]
    Sensor(String),

    /// Frame size differs from the first frame of the session
    #[error("frame geometry changed from {expected:?} to {actual:?}")]
    FrameGeometry {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Too many consecutive periods without a frame
    #[error("no frame for {misses} consecutive periods")]
    SensorStarved { misses: u32 },

    /// A collaborator panicked inside the control cycle
    #[error("control cycle panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_message() {
        let err = ControlError::InvalidTransition {
            from: ControllerState::Running,
            operation: "start",
        };
        assert_eq!(err.to_string(), "Cannot start while running");
    }

    #[test]
    fn test_fault_message() {
        let fault = WorkerFault::FrameGeometry {
            expected: (12, 8),
            actual: (9, 8),
        };
        assert_eq!(fault.to_string(), "frame geometry changed from (12, 8) to (9, 8)");
    }
}
