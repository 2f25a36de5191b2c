//! Controller configuration

use crate::ControlError;
use avoidance::Thresholds;
use drive_control::MAX_STEER_DEG;
use serde::{Deserialize, Serialize};

/// Controller configuration, fixed for the controller's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Near-field cutoff for the bottom quarter of the frame (depth units)
    pub low_threshold: u16,

    /// Far-field cutoff for the upper three quarters (depth units)
    pub high_threshold: u16,

    /// Servo center trim handed to the actuator (degrees)
    pub steer_angle_offset: i16,

    /// Steering deflection when avoiding (degrees)
    pub steer_angle: i16,

    /// Forward throttle while driving (percent)
    pub cruise_speed: u8,

    /// Log every verdict at info level
    pub verbose: bool,

    /// Fault the loop after this many consecutive missing frames
    pub max_consecutive_misses: Option<u32>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            low_threshold: 400,
            high_threshold: 700,
            steer_angle_offset: 7,
            steer_angle: 35,
            cruise_speed: 70,
            verbose: false,
            max_consecutive_misses: None,
        }
    }
}

impl ControllerConfig {
    /// Check ranges and build the threshold pair
    pub fn validate(&self) -> Result<Thresholds, ControlError> {
        if self.cruise_speed == 0 || self.cruise_speed > 100 {
            return Err(ControlError::Config(format!(
                "cruise_speed {} outside 1..=100",
                self.cruise_speed
            )));
        }
        if !(0..=MAX_STEER_DEG).contains(&self.steer_angle) {
            return Err(ControlError::Config(format!(
                "steer_angle {} outside 0..={}",
                self.steer_angle, MAX_STEER_DEG
            )));
        }
        if self.max_consecutive_misses == Some(0) {
            return Err(ControlError::Config(
                "max_consecutive_misses must be at least 1".to_string(),
            ));
        }
        Ok(Thresholds::new(self.low_threshold, self.high_threshold)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let thresholds = ControllerConfig::default().validate().unwrap();
        assert_eq!((thresholds.low(), thresholds.high()), (400, 700));
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_speed = ControllerConfig { cruise_speed: 0, ..Default::default() };
        assert!(matches!(zero_speed.validate(), Err(ControlError::Config(_))));

        let wide = ControllerConfig { steer_angle: 60, ..Default::default() };
        assert!(matches!(wide.validate(), Err(ControlError::Config(_))));

        let no_low = ControllerConfig { low_threshold: 0, ..Default::default() };
        assert!(matches!(no_low.validate(), Err(ControlError::Decision(_))));

        let no_misses = ControllerConfig { max_consecutive_misses: Some(0), ..Default::default() };
        assert!(matches!(no_misses.validate(), Err(ControlError::Config(_))));
    }
}
