use super::types::{SessionMetrics, SummaryStatistics, TimeSeriesPoint};

/// Median; mean of the two middle values for even lengths, 0 when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn summary_statistics(series: &[TimeSeriesPoint]) -> SummaryStatistics {
    if series.is_empty() {
        return SummaryStatistics::default();
    }

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    SummaryStatistics {
        mean: mean(&values),
        median: median(&values),
        std_dev: std_dev(&values),
        range: max - min,
        min,
        max,
        count: values.len(),
    }
}

pub fn session_metrics(series: &[TimeSeriesPoint]) -> SessionMetrics {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return SessionMetrics::default();
    };

    let duration = if series.len() > 1 {
        (last.timestamp - first.timestamp) / 1000.0
    } else {
        0.0
    };
    let sampling_rate = if duration > 0.0 {
        series.len() as f64 / duration
    } else {
        0.0
    };

    SessionMetrics {
        duration,
        sampling_rate,
        data_points: series.len(),
    }
}
