//! Trend estimators and pattern counters for short series.
//!
//! Two independent slope estimators live here. They answer the same question
//! with different sensitivity and can disagree on the same input:
//! - [`least_squares_slope`]: ordinary least-squares fit against the sample index.
//! - [`half_split_trend`]: difference of the two half-window means, spread over
//!   the half-window length.

/// Ordinary least-squares slope of `values` against their index (units per sample).
///
/// Needs at least two points.
pub fn least_squares_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Half-split trend: `(mean(second half) - mean(first half)) / (n / 2)`.
///
/// With an odd length the middle sample belongs to the second half. Needs at
/// least two points.
pub fn half_split_trend(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let half = n / 2;
    let (first, second) = values.split_at(half);
    let first_mean = first.iter().sum::<f64>() / first.len() as f64;
    let second_mean = second.iter().sum::<f64>() / second.len() as f64;
    Some((second_mean - first_mean) / half as f64)
}

/// Count interior points that exceed `factor` times both neighbours.
pub fn count_spikes(values: &[f64], factor: f64) -> usize {
    if values.len() < 3 {
        return 0;
    }
    values
        .windows(3)
        .filter(|w| w[1] > w[0] * factor && w[1] > w[2] * factor)
        .count()
}
