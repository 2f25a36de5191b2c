//! Depth frame types

use crate::SensorError;
use ndarray::{s, Array2, ArrayView2};
use std::ops::Range;

/// Depth frame in sensor units (z16), indexed `[row, column]`
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    samples: Array2<u16>,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl DepthFrame {
    /// Wrap a `height x width` sample grid
    pub fn new(samples: Array2<u16>) -> Self {
        Self {
            samples,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Build a frame from row-major raw samples
    pub fn from_raw(data: Vec<u16>, width: usize, height: usize) -> Result<Self, SensorError> {
        let samples = Array2::from_shape_vec((height, width), data)
            .map_err(|e| SensorError::Decode(format!("{}x{} frame: {}", width, height, e)))?;
        Ok(Self::new(samples))
    }

    /// Frame with every sample set to `value`
    pub fn filled(width: usize, height: usize, value: u16) -> Self {
        Self::new(Array2::from_elem((height, width), value))
    }

    /// Attach capture timing
    pub fn with_timing(mut self, timestamp_ns: u64, sequence: u32) -> Self {
        self.timestamp_ns = timestamp_ns;
        self.sequence = sequence;
        self
    }

    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    /// (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Get sample at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        self.samples.get((y, x)).copied()
    }

    /// Read-only view of the whole grid
    pub fn samples(&self) -> ArrayView2<'_, u16> {
        self.samples.view()
    }

    /// Overwrite a column/row window, clamped to the frame
    pub fn fill_region(&mut self, columns: Range<usize>, rows: Range<usize>, value: u16) {
        let columns = columns.start.min(self.width())..columns.end.min(self.width());
        let rows = rows.start.min(self.height())..rows.end.min(self.height());
        if columns.is_empty() || rows.is_empty() {
            return;
        }
        self.samples.slice_mut(s![rows, columns]).fill(value);
    }

    /// Left-right mirror image of this frame
    pub fn mirrored(&self) -> DepthFrame {
        DepthFrame {
            samples: self.samples.slice(s![.., ..;-1]).to_owned(),
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        }
    }
}
