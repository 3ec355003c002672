//! Wire shapes of the ingestion and query endpoints.

use serde::{Deserialize, Serialize};

use crate::analysis::TimeSeriesPoint;
use crate::db::GazeSample;

/// One row of an upload batch.
///
/// The ingestion table has a `user_id` column but the pipeline has no user
/// identity of its own, so it carries the session id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    pub user_id: String,
    pub session_id: String,
    pub timestamp_ms: i64,
    pub gaze_x: f64,
    pub sampling_rate: f64,
    pub device: String,
    pub device_label: String,
    pub calibration_params: [f64; 3],
}

impl From<&GazeSample> for MeasurementRecord {
    fn from(sample: &GazeSample) -> Self {
        Self {
            user_id: sample.session_id.clone(),
            session_id: sample.session_id.clone(),
            timestamp_ms: sample.timestamp_ms,
            gaze_x: sample.value,
            sampling_rate: sample.sampling_rate,
            device: sample.device_label.clone(),
            device_label: sample.device_label.clone(),
            calibration_params: sample.calibration_params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadRequest {
    pub measurement_batch: Vec<MeasurementRecord>,
}

impl UploadRequest {
    pub fn from_samples(samples: &[GazeSample]) -> Self {
        Self {
            measurement_batch: samples.iter().map(MeasurementRecord::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionIdsResponse {
    #[serde(default)]
    pub session_ids: Vec<String>,
}

/// A downloaded row. Only the fields the analysis needs are typed; the
/// backend may return nulls for the measurement columns.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteMeasurement {
    pub timestamp_ms: i64,
    #[serde(default)]
    pub gaze_x: Option<f64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub sampling_rate: Option<f64>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub data: Vec<RemoteMeasurement>,
}

/// Maps downloaded rows onto an ordered time series, dropping rows without a
/// gaze value.
pub fn to_time_series(rows: &[RemoteMeasurement]) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = rows
        .iter()
        .filter_map(|row| {
            row.gaze_x
                .filter(|value| value.is_finite())
                .map(|value| TimeSeriesPoint::new(row.timestamp_ms as f64, value))
        })
        .collect();
    // The query endpoint does not order its rows.
    points.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    points
}
