//! Scripted depth sensor for bench runs and tests

use crate::{DepthFrame, DepthSensor, SensorConfig, SensorError};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One acquisition outcome in a playback script
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver this frame
    Frame(DepthFrame),
    /// No frame this period
    Miss,
    /// Stream breaks with the given reason
    Fail(String),
}

/// Sensor that plays back a fixed script, one step per frame period
pub struct ScriptedSensor {
    steps: Vec<ScriptStep>,
    cursor: usize,
    repeat: bool,
    period: Duration,
    sequence: u32,
    released: Arc<AtomicBool>,
    acquired: Arc<AtomicUsize>,
}

impl ScriptedSensor {
    /// Loop over `steps` forever, sleeping `period` before each step
    pub fn new(steps: Vec<ScriptStep>, period: Duration) -> Self {
        Self {
            steps,
            cursor: 0,
            repeat: true,
            period,
            sequence: 0,
            released: Arc::new(AtomicBool::new(false)),
            acquired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Play the script once, then report misses
    pub fn once(steps: Vec<ScriptStep>, period: Duration) -> Self {
        Self {
            repeat: false,
            ..Self::new(steps, period)
        }
    }

    /// Flag set once `release` has been called
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    /// Number of acquisition attempts served so far
    pub fn acquired_counter(&self) -> Arc<AtomicUsize> {
        self.acquired.clone()
    }
}

impl DepthSensor for ScriptedSensor {
    fn acquire_frame(&mut self) -> Result<Option<DepthFrame>, SensorError> {
        if self.released.load(Ordering::Acquire) {
            return Err(SensorError::Released);
        }
        if !self.period.is_zero() {
            std::thread::sleep(self.period);
        }
        self.acquired.fetch_add(1, Ordering::Relaxed);

        if self.cursor >= self.steps.len() {
            if !self.repeat || self.steps.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let step = self.steps[self.cursor].clone();
        self.cursor += 1;

        match step {
            ScriptStep::Frame(frame) => {
                self.sequence = self.sequence.wrapping_add(1);
                let timestamp_ns = self.period.as_nanos() as u64 * self.sequence as u64;
                Ok(Some(frame.with_timing(timestamp_ns, self.sequence)))
            }
            ScriptStep::Miss => Ok(None),
            ScriptStep::Fail(reason) => Err(SensorError::Stream(reason)),
        }
    }

    fn release(&mut self) -> Result<(), SensorError> {
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!(
                "Scripted sensor released after {} acquisitions",
                self.acquired.load(Ordering::Relaxed)
            );
        }
        Ok(())
    }
}

/// Canned obstacle layouts for simulated runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticScene {
    /// Nothing within range
    Clear,
    /// Obstacle ahead, left flank blocked
    LeftWall,
    /// Obstacle ahead, right flank blocked
    RightWall,
    /// Obstacle dead ahead, both flanks open
    Pillar,
    /// Everything blocked
    DeadEnd,
    /// Cycles through the other layouts with an occasional dropped frame
    Slalom,
}

/// Background distance for synthetic frames
const FAR_SAMPLE: u16 = 3000;
/// Obstacle distance for synthetic frames
const NEAR_SAMPLE: u16 = 350;

impl SyntheticScene {
    /// Render one frame of a static layout
    pub fn frame(&self, width: usize, height: usize) -> DepthFrame {
        let third = width / 3;
        let mut frame = DepthFrame::filled(width, height, FAR_SAMPLE);
        let (left, center, right) = match self {
            SyntheticScene::Clear | SyntheticScene::Slalom => (false, false, false),
            SyntheticScene::LeftWall => (true, true, false),
            SyntheticScene::RightWall => (false, true, true),
            SyntheticScene::Pillar => (false, true, false),
            SyntheticScene::DeadEnd => (true, true, true),
        };
        if left {
            frame.fill_region(0..third, 0..height, NEAR_SAMPLE);
        }
        if center {
            frame.fill_region(third..2 * third, 0..height, NEAR_SAMPLE);
        }
        if right {
            frame.fill_region(2 * third..width, 0..height, NEAR_SAMPLE);
        }
        frame
    }

    /// Playback script for this scene at the configured resolution
    pub fn script(&self, config: &SensorConfig) -> Vec<ScriptStep> {
        let (w, h) = (config.width, config.height);
        match self {
            SyntheticScene::Slalom => vec![
                ScriptStep::Frame(SyntheticScene::Clear.frame(w, h)),
                ScriptStep::Frame(SyntheticScene::LeftWall.frame(w, h)),
                ScriptStep::Frame(SyntheticScene::Clear.frame(w, h)),
                ScriptStep::Miss,
                ScriptStep::Frame(SyntheticScene::RightWall.frame(w, h)),
                ScriptStep::Frame(SyntheticScene::Pillar.frame(w, h)),
                ScriptStep::Frame(SyntheticScene::Clear.frame(w, h)),
            ],
            scene => vec![ScriptStep::Frame(scene.frame(w, h))],
        }
    }

}

impl FromStr for SyntheticScene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(SyntheticScene::Clear),
            "left-wall" | "left" => Ok(SyntheticScene::LeftWall),
            "right-wall" | "right" => Ok(SyntheticScene::RightWall),
            "pillar" => Ok(SyntheticScene::Pillar),
            "dead-end" | "blocked" => Ok(SyntheticScene::DeadEnd),
            "slalom" => Ok(SyntheticScene::Slalom),
            other => Err(format!("unknown scene '{}'", other)),
        }
    }
}
