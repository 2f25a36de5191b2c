//! Control loop: acquire, decide, act

use crate::signal::LoopSignals;
use crate::state::StatusCell;
use crate::{ControlError, ControllerConfig, WorkerFault};
use avoidance::{assess, DirectionVerdict, Thresholds};
use depth_sensor::DepthSensor;
use drive_control::Actuator;
use metrics::counter;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Per-session driving parameters derived from the configuration
#[derive(Debug, Clone, Copy)]
pub(crate) struct DrivePolicy {
    pub thresholds: Thresholds,
    pub cruise_speed: u8,
    pub steer_angle: i16,
    pub verbose: bool,
    pub max_consecutive_misses: Option<u32>,
}

impl DrivePolicy {
    pub(crate) fn from_config(config: &ControllerConfig) -> Result<Self, ControlError> {
        Ok(Self {
            thresholds: config.validate()?,
            cruise_speed: config.cruise_speed,
            steer_angle: config.steer_angle,
            verbose: config.verbose,
            max_consecutive_misses: config.max_consecutive_misses,
        })
    }

    /// Count one missing frame, faulting once the configured limit is hit
    pub(crate) fn record_miss(&self, misses: &mut u32) -> Option<WorkerFault> {
        *misses = misses.saturating_add(1);
        debug!("No depth frame this period ({} in a row)", misses);
        match self.max_consecutive_misses {
            Some(limit) if *misses >= limit => Some(WorkerFault::SensorStarved { misses: *misses }),
            _ => None,
        }
    }
}

/// Everything the worker thread owns or shares for one session
pub(crate) struct Worker {
    pub session: Uuid,
    pub sensor: Box<dyn DepthSensor>,
    pub actuator: Arc<dyn Actuator>,
    pub signals: Arc<LoopSignals>,
    pub status: Arc<StatusCell>,
    pub faults: Arc<watch::Sender<Option<WorkerFault>>>,
    pub policy: DrivePolicy,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Worker {
    /// Run until stopped or faulted, handing the sensor back for release
    pub(crate) fn run(mut self) -> Box<dyn DepthSensor> {
        let span = info_span!("session", id = %self.session);
        let _guard = span.enter();
        info!("Control loop started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.drive()));
        let fault = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(fault),
            Err(payload) => Some(WorkerFault::Panicked(panic_message(payload.as_ref()))),
        };

        match fault {
            Some(fault) => self.fail(fault),
            None => info!("Control loop exited"),
        }
        self.sensor
    }

    fn drive(&mut self) -> Result<(), WorkerFault> {
        let mut geometry: Option<(usize, usize)> = None;
        let mut misses: u32 = 0;

        while !self.signals.stop_requested() {
            if !self.signals.wait_for_gate() {
                break;
            }

            let frame = match self.sensor.acquire_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    counter!("avoidance_frame_misses_total").increment(1);
                    if let Some(fault) = self.policy.record_miss(&mut misses) {
                        return Err(fault);
                    }
                    continue;
                }
                Err(e) => return Err(WorkerFault::Sensor(e.to_string())),
            };
            misses = 0;

            // Stop arrived while we were blocked on the sensor
            if self.signals.stop_requested() {
                break;
            }

            let dims = frame.dimensions();
            match geometry {
                None => geometry = Some(dims),
                Some(expected) if expected != dims => {
                    return Err(WorkerFault::FrameGeometry { expected, actual: dims });
                }
                Some(_) => {}
            }

            let report = assess(&frame, &self.policy.thresholds);
            let verdict = report.verdict();
            counter!("avoidance_frames_total").increment(1);
            counter!("avoidance_verdicts_total", "verdict" => verdict.as_str()).increment(1);

            if self.policy.verbose {
                info!(sequence = frame.sequence, ?report, "verdict: {}", verdict);
            } else {
                debug!(sequence = frame.sequence, "verdict: {}", verdict);
            }

            self.apply(verdict);
        }

        Ok(())
    }

    fn apply(&self, verdict: DirectionVerdict) {
        let speed = self.policy.cruise_speed;
        let angle = self.policy.steer_angle;
        match verdict {
            DirectionVerdict::Forward => {
                self.actuator.turn(0);
                self.actuator.forward(speed);
            }
            DirectionVerdict::Right => {
                self.actuator.turn(angle);
                self.actuator.forward(speed);
            }
            DirectionVerdict::Left => {
                self.actuator.turn(-angle);
                self.actuator.forward(speed);
            }
            DirectionVerdict::Stop => self.actuator.brake(),
        }
    }

    fn fail(&self, fault: WorkerFault) {
        error!("Control loop fault: {}", fault);
        counter!("avoidance_worker_faults_total").increment(1);

        // Faulted is published before the outputs drop; resume re-checks it
        if !self.status.fault_if_active() {
            warn!("Fault raised after the controller left the active states");
        }
        self.actuator.disable_controls();
        self.actuator.brake();

        self.faults.send_replace(Some(fault));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControllerState;
    use depth_sensor::{DepthFrame, ScriptStep, ScriptedSensor};
    use drive_control::{DriveCommand, RecordingActuator};
    use std::time::Duration;

    fn policy() -> DrivePolicy {
        DrivePolicy {
            thresholds: Thresholds::default(),
            cruise_speed: 70,
            steer_angle: 35,
            verbose: true,
            max_consecutive_misses: None,
        }
    }

    fn worker(
        script: Vec<ScriptStep>,
        policy: DrivePolicy,
    ) -> (Worker, Arc<RecordingActuator>, watch::Receiver<Option<WorkerFault>>) {
        let actuator = Arc::new(RecordingActuator::new(0));
        let (tx, rx) = watch::channel(None);
        let worker = Worker {
            session: Uuid::new_v4(),
            sensor: Box::new(ScriptedSensor::once(script, Duration::ZERO)),
            actuator: actuator.clone(),
            signals: Arc::new(LoopSignals::new()),
            status: Arc::new(StatusCell::new(ControllerState::Running)),
            faults: Arc::new(tx),
            policy,
        };
        (worker, actuator, rx)
    }

    #[test]
    fn test_verdicts_map_to_commands() {
        let (worker, actuator, _rx) = worker(vec![], policy());
        worker.apply(DirectionVerdict::Left);
        worker.apply(DirectionVerdict::Stop);
        worker.apply(DirectionVerdict::Forward);
        assert_eq!(
            actuator.commands(),
            vec![
                DriveCommand::Turn { requested: -35, applied: -35 },
                DriveCommand::Forward(70),
                DriveCommand::Brake,
                DriveCommand::Turn { requested: 0, applied: 0 },
                DriveCommand::Forward(70),
            ]
        );
    }

    #[test]
    fn test_sensor_error_faults_and_brakes() {
        let (worker, actuator, rx) = worker(
            vec![
                ScriptStep::Frame(DepthFrame::filled(12, 8, 1000)),
                ScriptStep::Fail("usb reset".into()),
            ],
            policy(),
        );
        let status = worker.status.clone();
        worker.run();

        assert_eq!(status.load(), ControllerState::Faulted);
        assert_eq!(*rx.borrow(), Some(WorkerFault::Sensor("Streaming error: usb reset".into())));
        let commands = actuator.commands();
        assert_eq!(
            &commands[commands.len() - 2..],
            &[DriveCommand::DisableControls, DriveCommand::Brake]
        );
    }

    #[test]
    fn test_geometry_change_faults() {
        let (worker, _actuator, rx) = worker(
            vec![
                ScriptStep::Frame(DepthFrame::filled(12, 8, 1000)),
                ScriptStep::Frame(DepthFrame::filled(9, 8, 1000)),
            ],
            policy(),
        );
        worker.run();
        assert_eq!(
            *rx.borrow(),
            Some(WorkerFault::FrameGeometry { expected: (12, 8), actual: (9, 8) })
        );
    }

    #[test]
    fn test_miss_limit_starves() {
        let limited = DrivePolicy {
            max_consecutive_misses: Some(3),
            ..policy()
        };
        let (worker, actuator, rx) = worker(vec![ScriptStep::Miss], limited);
        worker.run();
        assert_eq!(*rx.borrow(), Some(WorkerFault::SensorStarved { misses: 3 }));
        assert_eq!(actuator.count(|c| c.is_motion()), 0);
    }

    #[test]
    fn test_miss_count_saturates() {
        let mut misses = u32::MAX - 1;
        assert_eq!(policy().record_miss(&mut misses), None);
        assert_eq!(policy().record_miss(&mut misses), None);
        assert_eq!(misses, u32::MAX);

        let limited = DrivePolicy {
            max_consecutive_misses: Some(2),
            ..policy()
        };
        let mut misses = 0;
        assert_eq!(limited.record_miss(&mut misses), None);
        assert_eq!(
            limited.record_miss(&mut misses),
            Some(WorkerFault::SensorStarved { misses: 2 })
        );
    }

    #[test]
    fn test_stop_before_start_skips_frames() {
        let (worker, actuator, rx) = worker(
            vec![ScriptStep::Frame(DepthFrame::filled(12, 8, 1000))],
            policy(),
        );
        worker.signals.request_stop();
        let status = worker.status.clone();
        worker.run();
        assert!(actuator.commands().is_empty());
        assert!(rx.borrow().is_none());
        assert_eq!(status.load(), ControllerState::Running);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("servo bus fault");
        assert_eq!(panic_message(payload.as_ref()), "servo bus fault");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
