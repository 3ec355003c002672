//! Calibrated gaze sample, the unit of recording, buffering and upload.

use serde::{Deserialize, Serialize};

use crate::analysis::TimeSeriesPoint;

/// One calibrated gaze reading.
///
/// `value` is always within [-1, 1]. Serialized as `gaze_x` to match the
/// ingestion endpoint's column name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GazeSample {
    pub session_id: String,
    pub timestamp_ms: i64,
    #[serde(rename = "gaze_x")]
    pub value: f64,
    pub sampling_rate: f64,
    pub device_label: String,
    pub calibration_params: [f64; 3],
}

impl GazeSample {
    pub fn point(&self) -> TimeSeriesPoint {
        TimeSeriesPoint::new(self.timestamp_ms as f64, self.value)
    }
}
