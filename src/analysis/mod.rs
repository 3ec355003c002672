//! Post-hoc analysis of recorded gaze traces.
//!
//! Everything here is pure and synchronous. Malformed but well-typed input
//! (too few points, zero time deltas) produces a defined empty or zero result
//! rather than an error.

pub mod dummy;
pub mod spectrum;
pub mod statistics;
pub mod types;
pub mod velocity;

pub use dummy::generate_dummy_series;
pub use spectrum::spectrum;
pub use statistics::{session_metrics, summary_statistics};
pub use types::{
    ChartSeries, SessionMetrics, SpectrumPoint, SpectrumResult, SummaryStatistics,
    TimeSeriesPoint, XAxis,
};
pub use velocity::{velocity, velocity_anomalies};

use serde::{Deserialize, Serialize};

/// Points with `start <= timestamp <= end`, for analysing part of a session.
pub fn series_between(series: &[TimeSeriesPoint], start: f64, end: f64) -> Vec<TimeSeriesPoint> {
    series
        .iter()
        .filter(|p| p.timestamp >= start && p.timestamp <= end)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub summary: SummaryStatistics,
    pub velocity_summary: SummaryStatistics,
    pub metrics: SessionMetrics,
    pub spectrum: SpectrumResult,
    /// Indices of points whose incoming velocity exceeded the threshold.
    pub velocity_anomalies: Vec<usize>,
    pub velocity: Vec<TimeSeriesPoint>,
}

pub fn analyze(series: &[TimeSeriesPoint], anomaly_threshold: f64) -> AnalysisReport {
    let velocity = velocity(series);
    AnalysisReport {
        summary: summary_statistics(series),
        velocity_summary: summary_statistics(&velocity),
        metrics: session_metrics(series),
        spectrum: spectrum(series),
        velocity_anomalies: velocity_anomalies(series, anomaly_threshold),
        velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_inclusive() {
        let series: Vec<TimeSeriesPoint> = (0..10)
            .map(|i| TimeSeriesPoint::new(i as f64 * 100.0, i as f64))
            .collect();
        let window = series_between(&series, 200.0, 500.0);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].timestamp, 200.0);
        assert_eq!(window[3].timestamp, 500.0);
    }

    #[test]
    fn report_over_empty_series_is_all_defaults() {
        let report = analyze(&[], 1000.0);
        assert_eq!(report.summary.count, 0);
        assert_eq!(report.velocity_summary.count, 0);
        assert!(report.velocity.is_empty());
        assert_eq!(report.spectrum, SpectrumResult::empty());
        assert!(report.velocity_anomalies.is_empty());
    }

    #[test]
    fn report_bundles_all_products() {
        let series: Vec<TimeSeriesPoint> = (0..8)
            .map(|i| TimeSeriesPoint::new(i as f64 * 1000.0, if i % 2 == 0 { -0.5 } else { 0.5 }))
            .collect();
        let report = analyze(&series, 0.5);

        assert_eq!(report.summary.count, 8);
        assert_eq!(report.velocity.len(), 7);
        assert_eq!(report.velocity_summary.count, 7);
        assert_eq!(report.metrics.data_points, 8);
        assert_eq!(report.spectrum.spectrum.len(), 4);
        // Every step moves 1.0 per second.
        assert_eq!(report.velocity_anomalies, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
