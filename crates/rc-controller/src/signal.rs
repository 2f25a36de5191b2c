//! Pause gate and stop flag shared with the control worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Coordination signals for one session.
///
/// The gate blocks the worker while closed; the stop flag is set once and
/// never cleared. Setting the stop flag also opens the gate so a parked worker
/// wakes and exits.
#[derive(Debug)]
pub(crate) struct LoopSignals {
    gate: Mutex<bool>,
    wake: Condvar,
    stop: AtomicBool,
}

impl LoopSignals {
    /// Gate starts open, stop flag clear
    pub(crate) fn new() -> Self {
        Self {
            gate: Mutex::new(true),
            wake: Condvar::new(),
            stop: AtomicBool::new(false),
        }
    }

    fn lock_gate(&self) -> MutexGuard<'_, bool> {
        self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn open_gate(&self) {
        *self.lock_gate() = true;
        self.wake.notify_all();
    }

    pub(crate) fn close_gate(&self) {
        *self.lock_gate() = false;
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.lock_gate()
    }

    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.open_gate();
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Block while the gate is closed.
    /// Returns `false` when the worker should exit instead of running.
    pub(crate) fn wait_for_gate(&self) -> bool {
        let mut open = self.lock_gate();
        while !*open && !self.stop_requested() {
            open = self
                .wake
                .wait(open)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        !self.stop_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_open_gate_passes() {
        let signals = LoopSignals::new();
        assert!(signals.is_open());
        assert!(signals.wait_for_gate());
    }

    #[test]
    fn test_closed_gate_blocks_until_opened() {
        let signals = Arc::new(LoopSignals::new());
        signals.close_gate();

        let waiter = {
            let signals = signals.clone();
            thread::spawn(move || signals.wait_for_gate())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        signals.open_gate();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_stop_wakes_parked_waiter() {
        let signals = Arc::new(LoopSignals::new());
        signals.close_gate();

        let waiter = {
            let signals = signals.clone();
            thread::spawn(move || signals.wait_for_gate())
        };
        thread::sleep(Duration::from_millis(20));

        signals.request_stop();
        assert!(!waiter.join().unwrap());
        assert!(signals.is_open());
        assert!(signals.stop_requested());
    }
}
