//! Raw iris midpoint -> calibrated gaze value, and frame-rate estimation.

use std::collections::VecDeque;
use std::time::Instant;

use crate::calibration::CalibrationSet;

use super::detector::Detection;

/// Landmark index of the left iris center in the 478-point face mesh.
pub const LEFT_IRIS_INDEX: usize = 468;
/// Landmark index of the right iris center in the 478-point face mesh.
pub const RIGHT_IRIS_INDEX: usize = 473;

pub const DEFAULT_FPS_WINDOW: usize = 30;

/// Mean x of the two iris anchors on the first detected face.
pub fn compute_midpoint(detection: &Detection) -> Option<f64> {
    let face = detection.first_face()?;
    let left = face.get(LEFT_IRIS_INDEX)?;
    let right = face.get(RIGHT_IRIS_INDEX)?;
    let midpoint = (left.x + right.x) / 2.0;
    midpoint.is_finite().then_some(midpoint)
}

/// Maps `midpoint` into [-1, 1] through two linear segments meeting at center.
///
/// Left of center is scaled by `center - left`, right of center by
/// `right - center`. Returns `None` for an incomplete set, a zero-width
/// segment on the side being evaluated, or a non-finite result.
pub fn calibrate(midpoint: f64, calibration: &CalibrationSet) -> Option<f64> {
    let [left, center, right] = calibration.params()?;
    if !midpoint.is_finite() {
        return None;
    }

    let span = if midpoint <= center {
        center - left
    } else {
        right - center
    };
    if span == 0.0 || !span.is_finite() {
        return None;
    }

    let raw = (midpoint - center) / span;
    raw.is_finite().then(|| raw.clamp(-1.0, 1.0))
}

/// `1000 / mean(intervals_ms)`, or 0 for an empty window.
pub fn estimate_fps(intervals_ms: &[f64]) -> f64 {
    if intervals_ms.is_empty() {
        return 0.0;
    }
    let mean = intervals_ms.iter().sum::<f64>() / intervals_ms.len() as f64;
    if mean > 0.0 {
        1000.0 / mean
    } else {
        0.0
    }
}

/// Rolling window of the most recent inter-frame durations.
#[derive(Debug, Clone)]
pub struct FpsEstimator {
    intervals_ms: VecDeque<f64>,
    capacity: usize,
    last_frame: Option<Instant>,
}

impl FpsEstimator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            intervals_ms: VecDeque::with_capacity(capacity),
            capacity,
            last_frame: None,
        }
    }

    pub fn record_interval(&mut self, interval_ms: f64) {
        if !interval_ms.is_finite() || interval_ms < 0.0 {
            return;
        }
        if self.intervals_ms.len() == self.capacity {
            self.intervals_ms.pop_front();
        }
        self.intervals_ms.push_back(interval_ms);
    }

    /// Records the time since the previous call. The first call only sets the anchor.
    pub fn mark_frame(&mut self, now: Instant) {
        if let Some(previous) = self.last_frame.replace(now) {
            let elapsed = now.saturating_duration_since(previous);
            self.record_interval(elapsed.as_secs_f64() * 1000.0);
        }
    }

    /// Current estimate rounded to two decimals.
    pub fn fps(&self) -> f64 {
        let intervals: Vec<f64> = self.intervals_ms.iter().copied().collect();
        (estimate_fps(&intervals) * 100.0).round() / 100.0
    }

    pub fn len(&self) -> usize {
        self.intervals_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals_ms.is_empty()
    }

    pub fn reset(&mut self) {
        self.intervals_ms.clear();
        self.last_frame = None;
    }
}

impl Default for FpsEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}
