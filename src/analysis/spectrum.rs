//! Windowed FFT magnitude spectrum of a gaze trace.

use std::f64::consts::PI;

use num_complex::Complex64;
use rustfft::FftPlanner;

use super::types::{SpectrumPoint, SpectrumResult, TimeSeriesPoint};

pub const MIN_SPECTRUM_POINTS: usize = 4;

/// Hann window coefficients for `size` samples.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}

fn largest_power_of_two_at_most(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - len.leading_zeros())
    }
}

/// Magnitude spectrum and dominant frequency.
///
/// The series is truncated to the largest power-of-two length, de-meaned,
/// Hann windowed and transformed. The sample rate is taken from the mean
/// timestamp spacing of the truncated series, so sampling is assumed to be
/// roughly uniform. Bins `0..N/2` are reported; the DC bin is left out of the
/// dominant-frequency search.
///
/// Fewer than four points, non-finite values or a non-positive time span
/// produce an empty result.
pub fn spectrum(series: &[TimeSeriesPoint]) -> SpectrumResult {
    if series.len() < MIN_SPECTRUM_POINTS {
        return SpectrumResult::empty();
    }

    let n = largest_power_of_two_at_most(series.len());
    let window = &series[..n];
    if window
        .iter()
        .any(|p| !p.value.is_finite() || !p.timestamp.is_finite())
    {
        return SpectrumResult::empty();
    }

    let avg_dt_ms = (window[n - 1].timestamp - window[0].timestamp) / (n - 1) as f64;
    if avg_dt_ms <= 0.0 {
        return SpectrumResult::empty();
    }
    let sample_rate = 1000.0 / avg_dt_ms;

    let mean = window.iter().map(|p| p.value).sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex64> = window
        .iter()
        .zip(hann_window(n))
        .map(|(p, w)| Complex64::new((p.value - mean) * w, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bins: Vec<SpectrumPoint> = buffer
        .iter()
        .take(n / 2)
        .enumerate()
        .map(|(i, c)| SpectrumPoint {
            freq: i as f64 * sample_rate / n as f64,
            amp: c.norm(),
        })
        .collect();

    let dominant_freq = bins
        .iter()
        .skip(1)
        .fold(None::<&SpectrumPoint>, |best, point| match best {
            Some(b) if point.amp <= b.amp => Some(b),
            _ => Some(point),
        })
        .map(|p| p.freq)
        .unwrap_or(0.0);

    SpectrumResult {
        spectrum: bins,
        dominant_freq,
    }
}
