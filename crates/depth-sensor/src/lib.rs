//! Depth Sensor Interface for Obstacle Avoidance
//!
//! Provides the depth frame type and the blocking sensor facade consumed by
//! the avoidance controller. Supports:
//! - Stereo / structured-light depth cameras delivering z16 frames
//! - Scripted playback for bench runs without hardware

pub mod frame;
pub mod sim;

pub use frame::DepthFrame;
pub use sim::{ScriptStep, ScriptedSensor, SyntheticScene};

use std::time::Duration;
use thiserror::Error;

/// Depth sensor error types
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Failed to open depth sensor: {0}")]
    Open(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Sensor already released")]
    Released,

    #[error("Failed to release sensor: {0}")]
    Release(String),
}

/// Blocking depth sensor facade.
///
/// `acquire_frame` may block for up to one natural frame period. A frame that
/// was not delivered this period is `Ok(None)`; an `Err` means the stream is
/// broken.
pub trait DepthSensor: Send {
    /// Wait for the next depth frame
    fn acquire_frame(&mut self) -> Result<Option<DepthFrame>, SensorError>;

    /// Stop streaming and free the device (idempotent)
    fn release(&mut self) -> Result<(), SensorError>;
}

impl<S: DepthSensor + ?Sized> DepthSensor for Box<S> {
    fn acquire_frame(&mut self) -> Result<Option<DepthFrame>, SensorError> {
        (**self).acquire_frame()
    }

    fn release(&mut self) -> Result<(), SensorError> {
        (**self).release()
    }
}

/// Depth sensor configuration
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Device path (e.g., "/dev/video2")
    pub device: String,
    /// Frame width in samples
    pub width: usize,
    /// Frame height in samples
    pub height: usize,
    /// Target FPS
    pub fps: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video2".to_string(),
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl SensorConfig {
    /// Time between two frames at the configured rate
    pub fn frame_period(&self) -> Duration {
        if self.fps == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(1_000_000 / self.fps as u64)
    }
}
