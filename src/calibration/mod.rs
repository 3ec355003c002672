//! Three-point horizontal calibration.
//!
//! The user fixates left, center and right in that order; each fixation
//! captures the raw iris midpoint. Slots are write-once until `reset`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationStep {
    Left,
    Center,
    Right,
}

impl CalibrationStep {
    pub const ORDER: [CalibrationStep; 3] = [
        CalibrationStep::Left,
        CalibrationStep::Center,
        CalibrationStep::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationStep::Left => "left",
            CalibrationStep::Center => "center",
            CalibrationStep::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CalibrationSet {
    pub left: Option<f64>,
    pub center: Option<f64>,
    pub right: Option<f64>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for an already captured set.
    pub fn complete(left: f64, center: f64, right: f64) -> Self {
        Self {
            left: Some(left),
            center: Some(center),
            right: Some(right),
        }
    }

    pub fn get(&self, step: CalibrationStep) -> Option<f64> {
        match step {
            CalibrationStep::Left => self.left,
            CalibrationStep::Center => self.center,
            CalibrationStep::Right => self.right,
        }
    }

    fn slot_mut(&mut self, step: CalibrationStep) -> &mut Option<f64> {
        match step {
            CalibrationStep::Left => &mut self.left,
            CalibrationStep::Center => &mut self.center,
            CalibrationStep::Right => &mut self.right,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.center.is_some() && self.right.is_some()
    }

    /// `[left, center, right]` once complete, as stored alongside every sample.
    pub fn params(&self) -> Option<[f64; 3]> {
        Some([self.left?, self.center?, self.right?])
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalibrationStateMachine {
    set: CalibrationSet,
}

impl CalibrationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// First unset step in `left, center, right` order, `None` once complete.
    pub fn current_step(&self) -> Option<CalibrationStep> {
        CalibrationStep::ORDER
            .into_iter()
            .find(|step| self.set.get(*step).is_none())
    }

    /// Captures `raw_midpoint` for the current step.
    ///
    /// Returns false without touching state when calibration is already
    /// complete, the value is not finite, or the slot was filled concurrently.
    pub fn submit(&mut self, raw_midpoint: f64) -> bool {
        if !raw_midpoint.is_finite() {
            return false;
        }
        let Some(step) = self.current_step() else {
            return false;
        };

        let slot = self.set.slot_mut(step);
        if slot.is_some() {
            return false;
        }
        *slot = Some(raw_midpoint);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.set.is_complete()
    }

    pub fn reset(&mut self) {
        self.set = CalibrationSet::default();
    }

    pub fn calibration(&self) -> CalibrationSet {
        self.set
    }
}
