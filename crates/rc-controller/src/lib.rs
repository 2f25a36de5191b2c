//! Autonomous RC Avoidance Controller
//!
//! Runs a background control loop that pulls depth frames, classifies the
//! free space ahead and drives the steering servo and throttle. The loop is
//! started, paused, resumed, stopped and reset from the caller's thread:
//!
//! ```text
//! Ready --start--> Running <--pause/resume--> Paused
//!   ^                 |  \                      |
//!   |                 |   fault --> Faulted     |
//! reset             stop          |            stop
//!   |                 v           v             |
//!   +------------- Stopped <-----stop-----------+
//! ```

mod config;
mod controller;
mod error;
mod hardware;
mod ports;
mod signal;
mod state;
mod worker;

pub use config::ControllerConfig;
pub use controller::Controller;
pub use error::{ControlError, WorkerFault};
pub use hardware::{HardwareProvider, SimulatedHardware};
pub use ports::{GeoPoint, NavigationPorts, PositionSource, RouteSource};
pub use state::{ControllerState, StatusHandle, StatusReport};
