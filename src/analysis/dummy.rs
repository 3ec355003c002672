use rand::Rng;

use super::types::TimeSeriesPoint;

/// Uniform noise in [-1, 1] at a fixed interval, starting at `start_ms`.
///
/// Stand-in series for exercising the analysis and chart paths without a
/// recorded session.
pub fn generate_dummy_series<R: Rng>(
    rng: &mut R,
    len: usize,
    start_ms: f64,
    interval_ms: f64,
) -> Vec<TimeSeriesPoint> {
    (0..len)
        .map(|i| {
            TimeSeriesPoint::new(
                start_ms + i as f64 * interval_ms,
                rng.gen_range(-1.0..=1.0),
            )
        })
        .collect()
}
