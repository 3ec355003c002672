use serde::{Deserialize, Serialize};

/// `{timestamp, value}` pair shared by every analysis output and chart.
///
/// `timestamp` is milliseconds for time series and Hz for spectra.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: f64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub range: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpectrumPoint {
    pub freq: f64,
    pub amp: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumResult {
    pub spectrum: Vec<SpectrumPoint>,
    pub dominant_freq: f64,
}

impl SpectrumResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    /// Seconds between first and last point.
    pub duration: f64,
    /// Points per second over `duration`.
    pub sampling_rate: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum XAxis {
    /// Seconds since the first point.
    TimeOffset,
    /// Raw numeric axis, e.g. frequency in Hz.
    Numeric,
}

/// What a chart consumer is handed: points, optional fixed y range, axis kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub y_range: Option<(f64, f64)>,
    pub x_axis: XAxis,
}

impl ChartSeries {
    /// Gaze position over time on a fixed [-1, 1] axis.
    pub fn gaze(points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            points,
            y_range: Some((-1.0, 1.0)),
            x_axis: XAxis::TimeOffset,
        }
    }

    pub fn time_series(points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            points,
            y_range: None,
            x_axis: XAxis::TimeOffset,
        }
    }

    pub fn spectrum(result: &SpectrumResult) -> Self {
        Self {
            points: result
                .spectrum
                .iter()
                .map(|p| TimeSeriesPoint::new(p.freq, p.amp))
                .collect(),
            y_range: None,
            x_axis: XAxis::Numeric,
        }
    }

    /// X coordinates as the consumer should plot them.
    pub fn x_values(&self) -> Vec<f64> {
        match self.x_axis {
            XAxis::Numeric => self.points.iter().map(|p| p.timestamp).collect(),
            XAxis::TimeOffset => {
                let origin = self.points.first().map(|p| p.timestamp).unwrap_or(0.0);
                self.points
                    .iter()
                    .map(|p| (p.timestamp - origin) / 1000.0)
                    .collect()
            }
        }
    }
}
