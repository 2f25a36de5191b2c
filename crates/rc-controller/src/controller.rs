//! Controller lifecycle

use crate::hardware::HardwareProvider;
use crate::ports::{GeoPoint, NavigationPorts};
use crate::signal::LoopSignals;
use crate::state::{StatusCell, StatusHandle, StatusReport};
use crate::worker::{DrivePolicy, Worker};
use crate::{ControlError, ControllerConfig, ControllerState, WorkerFault};
use depth_sensor::DepthSensor;
use drive_control::Actuator;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Handles and signals for one operational session
struct Session {
    id: Uuid,
    actuator: Arc<dyn Actuator>,
    /// Held here until `start` moves it into the worker
    sensor: Option<Box<dyn DepthSensor>>,
    signals: Arc<LoopSignals>,
    worker: Option<JoinHandle<Box<dyn DepthSensor>>>,
}

impl Session {
    fn open(
        hardware: &dyn HardwareProvider,
        config: &ControllerConfig,
    ) -> Result<Self, ControlError> {
        let sensor = hardware.open_sensor()?;
        let actuator = hardware.open_actuator(config.steer_angle_offset)?;
        Ok(Self {
            id: Uuid::new_v4(),
            actuator,
            sensor: Some(sensor),
            signals: Arc::new(LoopSignals::new()),
            worker: None,
        })
    }
}

/// Obstacle-avoidance controller driving one RC vehicle
pub struct Controller {
    config: ControllerConfig,
    policy: DrivePolicy,
    hardware: Arc<dyn HardwareProvider>,
    ports: NavigationPorts,
    session: Session,
    status: Arc<StatusCell>,
    faults: Arc<watch::Sender<Option<WorkerFault>>>,
    start_fix: Option<GeoPoint>,
}

impl Controller {
    /// Validate the configuration and open the first session
    pub fn new(
        config: ControllerConfig,
        hardware: Arc<dyn HardwareProvider>,
    ) -> Result<Self, ControlError> {
        let policy = DrivePolicy::from_config(&config)?;
        let session = Session::open(hardware.as_ref(), &config)?;
        let (faults, _) = watch::channel(None);

        info!(
            "Controller ready (session {}, thresholds {}/{})",
            session.id, config.low_threshold, config.high_threshold
        );

        Ok(Self {
            config,
            policy,
            hardware,
            ports: NavigationPorts::default(),
            session,
            status: Arc::new(StatusCell::new(ControllerState::Ready)),
            faults: Arc::new(faults),
            start_fix: None,
        })
    }

    /// Attach optional navigation capabilities
    pub fn with_ports(mut self, ports: NavigationPorts) -> Self {
        debug!("Navigation ports attached: {:?}", ports);
        self.ports = ports;
        self
    }

    /// Spawn the control worker. Only valid from `Ready`.
    pub fn start(&mut self) -> Result<(), ControlError> {
        let current = self.status.load();
        if current != ControllerState::Ready {
            return Err(ControlError::InvalidTransition {
                from: current,
                operation: "start",
            });
        }
        let sensor = self.session.sensor.take().ok_or(ControlError::SensorMissing)?;

        self.start_fix = self.ports.current_fix();
        if let Some(fix) = self.start_fix {
            info!("Start position {:.6}, {:.6}", fix.latitude, fix.longitude);
        }

        let worker = Worker {
            session: self.session.id,
            sensor,
            actuator: self.session.actuator.clone(),
            signals: self.session.signals.clone(),
            status: self.status.clone(),
            faults: self.faults.clone(),
            policy: self.policy,
        };

        self.session.signals.open_gate();
        // Published before spawning so an early worker fault is not overwritten
        self.status.store(ControllerState::Running);

        let spawned = thread::Builder::new()
            .name("avoidance-loop".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.session.worker = Some(handle);
                info!("Controller running");
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn control worker: {}", e);
                self.status.store(ControllerState::Ready);
                Err(ControlError::Spawn(e))
            }
        }
    }

    /// Disable outputs and park the worker at its next gate check
    pub fn pause(&mut self) -> Result<(), ControlError> {
        self.status
            .transition(
                &[ControllerState::Running, ControllerState::Paused],
                ControllerState::Paused,
            )
            .map_err(|from| ControlError::InvalidTransition { from, operation: "pause" })?;

        if !self.session.signals.is_open() {
            debug!("Pause requested while already paused");
        }
        self.session.actuator.disable_controls();
        self.session.signals.close_gate();
        info!("Controller paused");
        Ok(())
    }

    /// Re-enable outputs and release a parked worker
    pub fn resume(&mut self) -> Result<(), ControlError> {
        self.status
            .transition(
                &[ControllerState::Running, ControllerState::Paused],
                ControllerState::Running,
            )
            .map_err(|from| ControlError::InvalidTransition { from, operation: "resume" })?;

        self.session.actuator.enable_controls();

        // The worker may have faulted after the transition above
        let current = self.status.load();
        if current == ControllerState::Faulted {
            warn!("Worker faulted during resume, forcing outputs off");
            self.session.actuator.disable_controls();
            self.session.actuator.brake();
            return Err(ControlError::InvalidTransition {
                from: current,
                operation: "resume",
            });
        }

        self.session.signals.open_gate();
        info!("Controller resumed");
        Ok(())
    }

    /// Stop the worker, wait for it to exit and release the sensor.
    ///
    /// Safe from every state; a no-op once stopped. A sensor teardown failure
    /// is returned after the worker has been joined.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        let previous = self.status.load();
        if previous == ControllerState::Stopped {
            debug!("Stop requested while already stopped");
            return Ok(());
        }

        self.status.store(ControllerState::Stopped);
        self.session.signals.request_stop();
        self.session.actuator.disable_controls();

        let sensor = match self.session.worker.take() {
            Some(handle) => match handle.join() {
                Ok(sensor) => Some(sensor),
                Err(_) => {
                    error!("Control worker panicked during shutdown");
                    None
                }
            },
            None => self.session.sensor.take(),
        };

        let released = match sensor {
            Some(mut sensor) => sensor.release().map_err(ControlError::Teardown),
            None => Ok(()),
        };
        if let Err(e) = &released {
            warn!("{}", e);
        }

        info!("Controller stopped (was {})", previous);
        released
    }

    /// Rebuild sensor, actuator and signals and return to `Ready`.
    ///
    /// A controller that is not stopped is stopped first.
    pub fn reset(&mut self) -> Result<(), ControlError> {
        if self.status.load() != ControllerState::Stopped {
            info!("Stopping controller before reset");
            if let Err(e) = self.stop() {
                warn!("Reset continues after teardown error: {}", e);
            }
        }

        self.session = Session::open(self.hardware.as_ref(), &self.config)?;
        self.faults.send_replace(None);
        self.start_fix = None;
        self.status.store(ControllerState::Ready);

        info!("Controller reset (session {})", self.session.id);
        Ok(())
    }

    /// Current lifecycle state
    pub fn get_status(&self) -> ControllerState {
        self.status.load()
    }

    /// Status view for other threads
    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle(self.status.clone())
    }

    /// Snapshot of state, session and last fault
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            state: self.get_status(),
            session: self.session.id,
            fault: self.last_fault(),
        }
    }

    /// Watch the worker fault channel
    pub fn subscribe_faults(&self) -> watch::Receiver<Option<WorkerFault>> {
        self.faults.subscribe()
    }

    /// Fault that ended the current session's worker, if any
    pub fn last_fault(&self) -> Option<WorkerFault> {
        self.faults.borrow().clone()
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Position captured when the worker was started
    pub fn start_fix(&self) -> Option<GeoPoint> {
        self.start_fix
    }

    /// Look up waypoints to `destination` through the route port
    pub fn route_to(&self, destination: GeoPoint) -> Option<Vec<GeoPoint>> {
        let route = self.ports.route.as_ref()?;
        let origin = self.start_fix.or_else(|| self.ports.current_fix())?;
        route.directions(origin, destination)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.session.worker.is_some() || self.session.sensor.is_some() {
            if let Err(e) = self.stop() {
                warn!("Teardown on drop failed: {}", e);
            }
        }
    }
}
