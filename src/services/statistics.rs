//! Statistics primitives over numeric slices
//!
//! Every function here degrades to a zero-valued or pass-through result on
//! empty or degenerate input instead of returning an error, so a missing
//! metric renders as 0 rather than breaking a chart.

use crate::types::{OutlierReport, StatisticsSummary};
use std::collections::BTreeMap;

/// Min, max, mean, sum, count and population standard deviation
pub fn calculate_statistics(values: &[f64]) -> StatisticsSummary {
    if values.is_empty() {
        return StatisticsSummary::default();
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = sum / count as f64;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / count as f64;

    StatisticsSummary {
        min,
        max,
        avg,
        sum,
        count,
        std_dev: variance.sqrt(),
    }
}

/// Nearest-rank percentiles, keyed by the requested percentile.
///
/// For `n` sorted values the rank of `p` is `ceil(p / 100 * n) - 1`,
/// clamped into `0..n`.
pub fn calculate_percentiles(values: &[f64], percentiles: &[u32]) -> BTreeMap<u32, f64> {
    if values.is_empty() {
        return percentiles.iter().map(|&p| (p, 0.0)).collect();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    percentiles
        .iter()
        .map(|&p| {
            let rank = (p as f64 / 100.0 * n as f64).ceil() as usize;
            let index = rank.saturating_sub(1).min(n - 1);
            (p, sorted[index])
        })
        .collect()
}

/// Pearson correlation coefficient of two equally sized series
pub fn calculate_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (a, b) in x.iter().zip(y) {
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_x2 += a * a;
        sum_y2 += b * b;
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

/// Trailing simple moving average.
///
/// Returns the input unchanged when it is shorter than the window
/// (or the window is zero).
pub fn calculate_moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    if window_size == 0 || values.len() < window_size {
        return values.to_vec();
    }

    values
        .windows(window_size)
        .map(|w| w.iter().sum::<f64>() / window_size as f64)
        .collect()
}

/// IQR outlier detection with index-based quartiles.
///
/// Q1 and Q3 are `sorted[floor(n * 0.25)]` and `sorted[floor(n * 0.75)]`.
/// Outliers keep their input order.
pub fn detect_outliers(values: &[f64]) -> OutlierReport {
    if values.is_empty() {
        return OutlierReport::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[((n as f64 * 0.75).floor() as usize).min(n - 1)];
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    let outliers = values
        .iter()
        .copied()
        .filter(|&v| v < lower_bound || v > upper_bound)
        .collect();

    OutlierReport {
        outliers,
        lower_bound,
        upper_bound,
        q1,
        q3,
    }
}
