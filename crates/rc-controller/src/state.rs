//! Controller lifecycle state

use crate::WorkerFault;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    /// Constructed or reset, no worker yet
    Ready = 0,
    /// Worker is driving
    Running = 1,
    /// Worker parked, outputs disabled
    Paused = 2,
    /// Worker joined, sensor released
    Stopped = 3,
    /// Worker exited after an internal failure
    Faulted = 4,
}

impl ControllerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ControllerState::Ready,
            1 => ControllerState::Running,
            2 => ControllerState::Paused,
            3 => ControllerState::Stopped,
            _ => ControllerState::Faulted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Ready => "ready",
            ControllerState::Running => "running",
            ControllerState::Paused => "paused",
            ControllerState::Stopped => "stopped",
            ControllerState::Faulted => "faulted",
        }
    }

    /// A worker is expected to be alive
    pub fn is_active(&self) -> bool {
        matches!(self, ControllerState::Running | ControllerState::Paused)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic state cell shared between the caller and the worker
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new(state: ControllerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ControllerState {
        ControllerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ControllerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move to `to` if the current state is one of `allowed`.
    /// Returns the previous state, or the current one on refusal.
    pub(crate) fn transition(
        &self,
        allowed: &[ControllerState],
        to: ControllerState,
    ) -> Result<ControllerState, ControllerState> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                allowed
                    .contains(&ControllerState::from_u8(current))
                    .then_some(to as u8)
            })
            .map(ControllerState::from_u8)
            .map_err(ControllerState::from_u8)
    }

    /// Worker-side: mark a live controller as faulted
    pub(crate) fn fault_if_active(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                ControllerState::from_u8(current)
                    .is_active()
                    .then_some(ControllerState::Faulted as u8)
            })
            .is_ok()
    }
}

/// Read-only status view that can be moved to other threads
#[derive(Debug, Clone)]
pub struct StatusHandle(pub(crate) Arc<StatusCell>);

impl StatusHandle {
    /// Current controller state
    pub fn get(&self) -> ControllerState {
        self.0.load()
    }
}

/// Status snapshot for operators and mission planners
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: ControllerState,
    pub session: Uuid,
    pub fault: Option<WorkerFault>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_states() {
        let cell = StatusCell::new(ControllerState::Ready);
        for state in [
            ControllerState::Running,
            ControllerState::Paused,
            ControllerState::Stopped,
            ControllerState::Faulted,
            ControllerState::Ready,
        ] {
            cell.store(state);
            assert_eq!(cell.load(), state);
        }
    }

    #[test]
    fn test_transition_guard() {
        let cell = StatusCell::new(ControllerState::Ready);
        let refused = cell.transition(&[ControllerState::Running], ControllerState::Paused);
        assert_eq!(refused, Err(ControllerState::Ready));

        cell.store(ControllerState::Running);
        let moved = cell.transition(
            &[ControllerState::Running, ControllerState::Paused],
            ControllerState::Paused,
        );
        assert_eq!(moved, Ok(ControllerState::Running));
        assert_eq!(cell.load(), ControllerState::Paused);
    }

    #[test]
    fn test_fault_only_from_active() {
        let cell = StatusCell::new(ControllerState::Stopped);
        assert!(!cell.fault_if_active());
        assert_eq!(cell.load(), ControllerState::Stopped);

        cell.store(ControllerState::Paused);
        assert!(cell.fault_if_active());
        assert_eq!(cell.load(), ControllerState::Faulted);
        assert!(!cell.fault_if_active());
    }

    #[test]
    fn test_active_states() {
        assert!(ControllerState::Running.is_active());
        assert!(ControllerState::Paused.is_active());
        assert!(!ControllerState::Ready.is_active());
        assert!(!ControllerState::Faulted.is_active());
    }
}
