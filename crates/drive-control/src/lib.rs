//! Drive Actuator Interface
//!
//! Steering servo and throttle facade used by the avoidance controller.
//! Implementations serialize access internally: the control loop issues
//! motion commands while the operator thread toggles outputs.

mod recorder;

pub use recorder::{RecordingActuator, DEFAULT_HISTORY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest steering deflection the servo accepts (degrees either side)
pub const MAX_STEER_DEG: i16 = 45;

/// Actuator error types
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("Failed to open drive controller: {0}")]
    Open(String),
}

/// Fire-and-forget drive train commands
pub trait Actuator: Send + Sync {
    /// Apply forward throttle (percent)
    fn forward(&self, speed: u8);

    /// Steer by `angle` degrees, negative is left, 0 is centered
    fn turn(&self, angle: i16);

    /// Cut throttle and brake
    fn brake(&self);

    /// Re-enable motor and servo outputs
    fn enable_controls(&self);

    /// Disable motor and servo outputs
    fn disable_controls(&self);
}

/// A drive command as seen by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveCommand {
    /// Forward throttle (percent)
    Forward(u8),
    /// Steering request and the servo angle after trim
    Turn { requested: i16, applied: i16 },
    Brake,
    EnableControls,
    DisableControls,
}

impl DriveCommand {
    /// Whether this command moves the vehicle
    pub fn is_motion(&self) -> bool {
        matches!(self, DriveCommand::Forward(_) | DriveCommand::Turn { .. })
    }
}

/// Apply the servo center trim and clamp to the mechanical range
pub fn trimmed_angle(angle: i16, trim: i16) -> i16 {
    angle.saturating_add(trim).clamp(-MAX_STEER_DEG, MAX_STEER_DEG)
}
