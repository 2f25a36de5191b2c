//! Free-space classification

use crate::Thresholds;
use depth_sensor::DepthFrame;
use ndarray::{s, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Steering verdict for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionVerdict {
    /// Path ahead is clear
    Forward,
    /// Steer left, away from a right-side obstacle
    Left,
    /// Steer right, away from a left-side obstacle
    Right,
    /// No way through
    Stop,
}

impl DirectionVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectionVerdict::Forward => "forward",
            DirectionVerdict::Left => "left",
            DirectionVerdict::Right => "right",
            DirectionVerdict::Stop => "stop",
        }
    }

    /// Verdict for the left-right mirrored scene
    pub fn mirrored(self) -> Self {
        match self {
            DirectionVerdict::Left => DirectionVerdict::Right,
            DirectionVerdict::Right => DirectionVerdict::Left,
            other => other,
        }
    }
}

impl fmt::Display for DirectionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sums of in-range samples for one vertical band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSums {
    /// Far-field region (upper 3/4), samples below the high threshold
    pub top: u64,
    /// Near-field region (lower 1/4), samples below the low threshold
    pub bottom: u64,
}

impl BandSums {
    /// Any qualifying sample in either region
    pub fn obstacle(&self) -> bool {
        self.top > 0 || self.bottom > 0
    }
}

/// Per-band breakdown of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandReport {
    pub left: BandSums,
    pub center: BandSums,
    pub right: BandSums,
}

impl BandReport {
    /// Apply the avoidance table to the band flags
    pub fn verdict(&self) -> DirectionVerdict {
        if !self.center.obstacle() {
            return DirectionVerdict::Forward;
        }
        match (self.left.obstacle(), self.right.obstacle()) {
            (true, false) => DirectionVerdict::Right,
            (false, true) => DirectionVerdict::Left,
            // Boxed in, or a lone obstacle dead ahead
            (true, true) | (false, false) => DirectionVerdict::Stop,
        }
    }
}

fn filtered_sum(region: ArrayView2<'_, u16>, limit: u16) -> u64 {
    region
        .iter()
        .filter(|&&sample| sample < limit)
        .map(|&sample| sample as u64)
        .sum()
}

fn band_sums(
    frame: &DepthFrame,
    columns: Range<usize>,
    split: usize,
    thresholds: &Thresholds,
) -> BandSums {
    let samples = frame.samples();
    BandSums {
        top: filtered_sum(samples.slice(s![..split, columns.clone()]), thresholds.high()),
        bottom: filtered_sum(samples.slice(s![split.., columns]), thresholds.low()),
    }
}

/// Partition a frame into bands and regions and sum the in-range samples.
///
/// Band width is `width / 3`; the right band absorbs the remainder. The
/// near-field region starts at row `3 * (height / 4)`.
pub fn assess(frame: &DepthFrame, thresholds: &Thresholds) -> BandReport {
    let (width, height) = frame.dimensions();
    let third = width / 3;
    let split = 3 * (height / 4);

    BandReport {
        left: band_sums(frame, 0..third, split, thresholds),
        center: band_sums(frame, third..2 * third, split, thresholds),
        right: band_sums(frame, 2 * third..width, split, thresholds),
    }
}

/// Steering verdict for a depth frame
pub fn decide(frame: &DepthFrame, thresholds: &Thresholds) -> DirectionVerdict {
    assess(frame, thresholds).verdict()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn thresholds() -> Thresholds {
        Thresholds::new(400, 700).unwrap()
    }

    #[test]
    fn test_all_far_is_forward() {
        let frame = DepthFrame::filled(12, 8, 1000);
        assert_eq!(decide(&frame, &thresholds()), DirectionVerdict::Forward);
    }

    #[test]
    fn test_left_near_field_with_clear_center_is_forward() {
        let mut frame = DepthFrame::filled(12, 8, 1000);
        frame.fill_region(0..4, 6..8, 300);

        let report = assess(&frame, &thresholds());
        assert_eq!(report.left.bottom, 300 * 8);
        assert!(!report.center.obstacle());
        assert_eq!(report.verdict(), DirectionVerdict::Forward);
    }

    #[test]
    fn test_center_far_field_is_stop() {
        let mut frame = DepthFrame::filled(12, 8, 1000);
        frame.fill_region(4..8, 0..6, 650);

        let report = assess(&frame, &thresholds());
        assert_eq!(report.center.top, 650 * 24);
        assert_eq!(report.center.bottom, 0);
        assert_eq!(report.verdict(), DirectionVerdict::Stop);
    }

    #[test]
    fn test_far_field_sample_ignored_in_near_field() {
        // 650 is below high but not below low
        let mut frame = DepthFrame::filled(12, 8, 1000);
        frame.fill_region(4..8, 6..8, 650);
        assert_eq!(decide(&frame, &thresholds()), DirectionVerdict::Forward);
    }

    #[test]
    fn test_decision_table() {
        let near = 300;
        let cases = [
            ((true, false), DirectionVerdict::Right),
            ((false, true), DirectionVerdict::Left),
            ((true, true), DirectionVerdict::Stop),
            ((false, false), DirectionVerdict::Stop),
        ];
        for ((left, right), expected) in cases {
            let mut frame = DepthFrame::filled(12, 8, 1000);
            frame.fill_region(4..8, 0..8, near);
            if left {
                frame.fill_region(0..4, 0..8, near);
            }
            if right {
                frame.fill_region(8..12, 0..8, near);
            }
            assert_eq!(decide(&frame, &thresholds()), expected, "left={} right={}", left, right);
        }
    }

    #[test]
    fn test_zero_samples_never_flag() {
        let frame = DepthFrame::filled(12, 8, 0);
        assert_eq!(assess(&frame, &thresholds()), BandReport::default());
        assert_eq!(decide(&frame, &thresholds()), DirectionVerdict::Forward);
    }

    #[test]
    fn test_right_band_absorbs_remainder() {
        // width 14: bands are 0..4, 4..8, 8..14
        let mut frame = DepthFrame::filled(14, 8, 1000);
        frame.fill_region(13..14, 0..1, 100);
        let report = assess(&frame, &thresholds());
        assert_eq!(report.right.top, 100);
        assert!(!report.left.obstacle());
        assert!(!report.center.obstacle());
    }

    #[test]
    fn test_short_frame_is_all_near_field() {
        // height 3: split row is 0, every row is near field
        let mut frame = DepthFrame::filled(6, 3, 1000);
        frame.fill_region(2..4, 0..1, 500);
        let report = assess(&frame, &thresholds());
        assert_eq!(report.center, BandSums::default());

        frame.fill_region(2..4, 0..1, 300);
        assert_eq!(assess(&frame, &thresholds()).center.bottom, 600);
    }

    #[test]
    fn test_narrow_frame_has_only_right_band() {
        let frame = DepthFrame::filled(2, 8, 100);
        let report = assess(&frame, &thresholds());
        assert!(!report.left.obstacle());
        assert!(!report.center.obstacle());
        assert!(report.right.obstacle());
        assert_eq!(report.verdict(), DirectionVerdict::Forward);
    }

    #[test]
    fn test_verdict_mirror() {
        assert_eq!(DirectionVerdict::Left.mirrored(), DirectionVerdict::Right);
        assert_eq!(DirectionVerdict::Stop.mirrored(), DirectionVerdict::Stop);
        assert_eq!(DirectionVerdict::Forward.to_string(), "forward");
    }

    /// Frames whose width splits evenly into three bands
    fn symmetric_frame() -> impl Strategy<Value = DepthFrame> {
        (1usize..6, 1usize..12).prop_flat_map(|(k, height)| {
            let width = 3 * k;
            prop::collection::vec(
                prop::sample::select(vec![0u16, 150, 399, 400, 650, 700, 1500]),
                width * height,
            )
            .prop_map(move |data| DepthFrame::from_raw(data, width, height).unwrap())
        })
    }

    proptest! {
        #[test]
        fn prop_mirror_swaps_flanks(frame in symmetric_frame()) {
            let t = thresholds();
            prop_assert_eq!(decide(&frame.mirrored(), &t), decide(&frame, &t).mirrored());
        }

        #[test]
        fn prop_clear_center_goes_forward(frame in symmetric_frame()) {
            let mut frame = frame;
            let (width, height) = frame.dimensions();
            let third = width / 3;
            frame.fill_region(third..2 * third, 0..height, 1500);
            prop_assert_eq!(decide(&frame, &thresholds()), DirectionVerdict::Forward);
        }

        #[test]
        fn prop_never_steers_into_obstacle(frame in symmetric_frame()) {
            let report = assess(&frame, &thresholds());
            let verdict = report.verdict();
            if report.left.obstacle() {
                prop_assert_ne!(verdict, DirectionVerdict::Left);
            }
            if report.right.obstacle() {
                prop_assert_ne!(verdict, DirectionVerdict::Right);
            }
            if !report.left.obstacle() && !report.center.obstacle() && !report.right.obstacle() {
                prop_assert_eq!(verdict, DirectionVerdict::Forward);
            }
        }
    }
}
