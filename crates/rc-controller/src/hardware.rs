//! Hardware session factories

use depth_sensor::{
    DepthSensor, ScriptStep, ScriptedSensor, SensorConfig, SensorError, SyntheticScene,
};
use drive_control::{Actuator, ActuatorError, RecordingActuator};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Opens fresh sensor and actuator handles for each controller session
pub trait HardwareProvider: Send + Sync {
    /// Open the depth camera
    fn open_sensor(&self) -> Result<Box<dyn DepthSensor>, SensorError>;

    /// Open the drive train with the given servo center trim
    fn open_actuator(&self, steer_trim: i16) -> Result<Arc<dyn Actuator>, ActuatorError>;
}

/// Scripted depth camera plus recording drive train
pub struct SimulatedHardware {
    script: Vec<ScriptStep>,
    period: Duration,
    repeat: bool,
    sessions: AtomicUsize,
    actuator: Mutex<Option<Arc<RecordingActuator>>>,
    released: Mutex<Option<Arc<AtomicBool>>>,
}

impl SimulatedHardware {
    /// Replay `script` in a loop, one step per `period`
    pub fn new(script: Vec<ScriptStep>, period: Duration) -> Self {
        Self {
            script,
            period,
            repeat: true,
            sessions: AtomicUsize::new(0),
            actuator: Mutex::new(None),
            released: Mutex::new(None),
        }
    }

    /// Replay `script` once per session, then report misses
    pub fn once(script: Vec<ScriptStep>, period: Duration) -> Self {
        Self {
            repeat: false,
            ..Self::new(script, period)
        }
    }

    /// Loop a synthetic scene at the configured resolution and rate
    pub fn from_scene(scene: SyntheticScene, config: &SensorConfig) -> Self {
        Self::new(scene.script(config), config.frame_period())
    }

    /// Drive train of the most recent session
    pub fn actuator(&self) -> Option<Arc<RecordingActuator>> {
        self.actuator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether the most recent session's sensor has been released
    pub fn sensor_released(&self) -> bool {
        self.released
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Number of sensor handles opened so far
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }
}

impl HardwareProvider for SimulatedHardware {
    fn open_sensor(&self) -> Result<Box<dyn DepthSensor>, SensorError> {
        let sensor = if self.repeat {
            ScriptedSensor::new(self.script.clone(), self.period)
        } else {
            ScriptedSensor::once(self.script.clone(), self.period)
        };
        *self.released.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some(sensor.release_flag());
        let session = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Opened simulated depth sensor #{} ({} script steps)", session, self.script.len());
        Ok(Box::new(sensor))
    }

    fn open_actuator(&self, steer_trim: i16) -> Result<Arc<dyn Actuator>, ActuatorError> {
        let actuator = Arc::new(RecordingActuator::new(steer_trim));
        *self.actuator.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some(actuator.clone());
        Ok(actuator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depth_sensor::DepthFrame;

    #[test]
    fn test_each_open_is_a_fresh_session() {
        let hardware = SimulatedHardware::once(
            vec![ScriptStep::Frame(DepthFrame::filled(3, 4, 1000))],
            Duration::ZERO,
        );

        let mut first = hardware.open_sensor().unwrap();
        assert!(first.acquire_frame().unwrap().is_some());
        first.release().unwrap();
        assert!(hardware.sensor_released());

        let mut second = hardware.open_sensor().unwrap();
        assert!(!hardware.sensor_released());
        assert!(second.acquire_frame().unwrap().is_some());
        assert_eq!(hardware.sessions_opened(), 2);
    }

    #[test]
    fn test_actuator_carries_trim() {
        let hardware = SimulatedHardware::new(vec![], Duration::ZERO);
        hardware.open_actuator(-3).unwrap();
        assert_eq!(hardware.actuator().unwrap().steer_trim(), -3);
    }
}
