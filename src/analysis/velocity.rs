use super::types::TimeSeriesPoint;

/// Rate of change per second between consecutive points.
///
/// Each output point carries the later timestamp of its pair. A zero (or
/// negative) time delta yields 0 for that pair.
pub fn velocity(series: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
    series
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            let dt_secs = (curr.timestamp - prev.timestamp) / 1000.0;
            let value = if dt_secs > 0.0 {
                (curr.value - prev.value) / dt_secs
            } else {
                0.0
            };
            TimeSeriesPoint::new(curr.timestamp, if value.is_finite() { value } else { 0.0 })
        })
        .collect()
}

/// Indices into `series` whose incoming velocity magnitude exceeds `threshold`.
///
/// Index `i` refers to the later point of the pair `(i - 1, i)`.
pub fn velocity_anomalies(series: &[TimeSeriesPoint], threshold: f64) -> Vec<usize> {
    velocity(series)
        .iter()
        .enumerate()
        .filter(|(_, point)| point.value.abs() > threshold)
        .map(|(i, _)| i + 1)
        .collect()
}
