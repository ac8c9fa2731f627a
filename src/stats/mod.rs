//! Percentile statistics over RTT samples
//!
//! Percentiles use linear interpolation between order statistics:
//! `k = (n - 1) * p / 100`, and when `k` is fractional the result is
//! `data[floor(k)] + (data[ceil(k)] - data[floor(k)]) * (k - floor(k))`.

use crate::{
    error::{AppError, Result},
    models::metrics::Statistics,
};

/// Percentiles reported for every run
pub const REPORTED_PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];

/// Return a sorted copy of the samples
pub fn sorted_samples(samples: &[f64]) -> Vec<f64> {
    let mut data = samples.to_vec();
    data.sort_by(|a, b| a.total_cmp(b));
    data
}

/// Percentile of already sorted values; `None` for an empty slice
pub fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> Option<f64> {
    if sorted_values.is_empty() {
        return None;
    }

    let k = (sorted_values.len() as f64 - 1.0) * (percentile / 100.0);
    let f = k.floor();
    let c = k.ceil();
    let lower_index = f as usize;
    let upper_index = (c as usize).min(sorted_values.len() - 1);

    if f == c {
        Some(sorted_values[lower_index])
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        Some(lower_value + (upper_value - lower_value) * (k - f))
    }
}

/// Percentile of unsorted values
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    percentile_sorted(&sorted_samples(values), percentile)
}

/// Compute min/avg/max and p50/p95/p99 over the successful RTT samples.
///
/// An empty sample set is an error: a run without successes has no statistics.
pub fn summarize(samples: &[f64]) -> Result<Statistics> {
    if samples.is_empty() {
        return Err(AppError::statistics("No samples provided for statistics calculation"));
    }

    let data = sorted_samples(samples);
    let n = data.len();
    let avg = data.iter().sum::<f64>() / n as f64;

    let [p50, p95, p99] = REPORTED_PERCENTILES.map(|p| {
        // non-empty, checked above
        percentile_sorted(&data, p).unwrap_or(data[0])
    });

    Ok(Statistics {
        min_ms: data[0],
        avg_ms: avg,
        max_ms: data[n - 1],
        p50_ms: p50,
        p95_ms: p95,
        p99_ms: p99,
        sample_count: n,
    })
}


// Additional comprehensive tests in separate module
#[cfg(test)]
mod comprehensive_tests;
