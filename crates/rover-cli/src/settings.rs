//! Layered configuration: TOML file, then `ROVER_*` environment

use config::{Config, ConfigError, Environment, File};
use depth_sensor::SensorConfig;
use rc_controller::ControllerConfig;
use serde::Deserialize;
use std::path::Path;

/// Simulated depth camera settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    /// Synthetic scene played by the simulated camera
    pub scene: String,
}

impl Default for SensorSettings {
    fn default() -> Self {
        let defaults = SensorConfig::default();
        Self {
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            scene: "slalom".to_string(),
        }
    }
}

impl SensorSettings {
    pub fn sensor_config(&self) -> SensorConfig {
        SensorConfig {
            device: "simulated".to_string(),
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }
}

/// Everything the console needs to build a controller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub controller: ControllerConfig,
    pub sensor: SensorSettings,
}

impl Settings {
    /// Load from an optional TOML file, overridden by `ROVER_SECTION__KEY`
    /// environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(
                Environment::with_prefix("ROVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
