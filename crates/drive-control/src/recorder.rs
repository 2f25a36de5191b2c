//! In-memory actuator that records what reached the drive train

use crate::{trimmed_angle, Actuator, DriveCommand};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Commands retained by [`RecordingActuator::new`]
pub const DEFAULT_HISTORY: usize = 1024;

#[derive(Debug)]
struct RecorderState {
    enabled: bool,
    /// Most recent commands, oldest first
    history: VecDeque<DriveCommand>,
    /// Commands that reached the drive train over the actuator's lifetime
    recorded: u64,
}

impl RecorderState {
    fn push(&mut self, command: DriveCommand, capacity: usize) {
        if self.history.len() == capacity {
            self.history.pop_front();
        }
        self.history.push_back(command);
        self.recorded += 1;
    }
}

/// Actuator that logs commands instead of driving hardware.
///
/// Motion commands issued while outputs are disabled are dropped, as a real
/// ESC ignores throttle with its output stage off. Brake always applies.
/// Only the latest `capacity` commands are kept.
#[derive(Debug)]
pub struct RecordingActuator {
    steer_trim: i16,
    capacity: usize,
    state: Mutex<RecorderState>,
}

impl RecordingActuator {
    /// Create an enabled actuator with the given servo center trim
    pub fn new(steer_trim: i16) -> Self {
        Self::with_capacity(steer_trim, DEFAULT_HISTORY)
    }

    /// Create an enabled actuator keeping at most `capacity` commands
    pub fn with_capacity(steer_trim: i16, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            steer_trim,
            capacity,
            state: Mutex::new(RecorderState {
                enabled: true,
                history: VecDeque::with_capacity(capacity),
                recorded: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, command: DriveCommand) {
        let mut state = self.lock();
        if command.is_motion() && !state.enabled {
            trace!("Dropping {:?}: outputs disabled", command);
            return;
        }
        debug!("Drive command: {:?}", command);
        state.push(command, self.capacity);
    }

    /// Snapshot of the retained commands, oldest first
    pub fn commands(&self) -> Vec<DriveCommand> {
        self.lock().history.iter().copied().collect()
    }

    /// Number of retained commands matching `pred`
    pub fn count(&self, pred: impl Fn(&DriveCommand) -> bool) -> usize {
        self.lock().history.iter().filter(|c| pred(c)).count()
    }

    /// Total commands that reached the drive train, including evicted ones
    pub fn recorded(&self) -> u64 {
        self.lock().recorded
    }

    /// Whether motor and servo outputs are live
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Servo center trim in degrees
    pub fn steer_trim(&self) -> i16 {
        self.steer_trim
    }
}

impl Actuator for RecordingActuator {
    fn forward(&self, speed: u8) {
        self.record(DriveCommand::Forward(speed));
    }

    fn turn(&self, angle: i16) {
        self.record(DriveCommand::Turn {
            requested: angle,
            applied: trimmed_angle(angle, self.steer_trim),
        });
    }

    fn brake(&self) {
        self.record(DriveCommand::Brake);
    }

    fn enable_controls(&self) {
        let mut state = self.lock();
        state.enabled = true;
        state.push(DriveCommand::EnableControls, self.capacity);
    }

    fn disable_controls(&self) {
        let mut state = self.lock();
        state.enabled = false;
        state.push(DriveCommand::DisableControls, self.capacity);
    }
}
