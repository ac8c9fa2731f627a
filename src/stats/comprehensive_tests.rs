//! Property-based and edge case tests for the percentile statistics

use super::{percentile_sorted, sorted_samples, summarize};
use proptest::collection::vec;
use proptest::prelude::*;

/// Property-based test generators
mod generators {
    use super::*;

    /// RTT-like positive floats in milliseconds
    pub fn rtt_samples() -> impl Strategy<Value = f64> {
        0.001f64..100000.0
    }

    /// Non-empty sample sets
    pub fn sample_vectors() -> impl Strategy<Value = Vec<f64>> {
        vec(rtt_samples(), 1..500)
    }
}

mod property_tests {
    use super::*;

    proptest! {
        /// Every reported value lies within [min, max]
        #[test]
        fn summary_values_within_range(samples in generators::sample_vectors()) {
            let stats = summarize(&samples).unwrap();
            let tolerance = 1e-9 * stats.max_ms.abs().max(1.0);

            for value in [stats.avg_ms, stats.p50_ms, stats.p95_ms, stats.p99_ms] {
                prop_assert!(value >= stats.min_ms - tolerance);
                prop_assert!(value <= stats.max_ms + tolerance);
            }
            prop_assert_eq!(stats.sample_count, samples.len());
        }

        /// Percentiles are monotone in p
        #[test]
        fn percentiles_are_monotone(samples in generators::sample_vectors()) {
            let stats = summarize(&samples).unwrap();
            let tolerance = 1e-9 * stats.max_ms.abs().max(1.0);
            prop_assert!(stats.p50_ms <= stats.p95_ms + tolerance);
            prop_assert!(stats.p95_ms <= stats.p99_ms + tolerance);
        }

        /// Input order does not matter
        #[test]
        fn order_independent(samples in generators::sample_vectors()) {
            let mut reversed = samples.clone();
            reversed.reverse();

            let a = summarize(&samples).unwrap();
            let b = summarize(&reversed).unwrap();
            prop_assert_eq!(a.p99_ms.to_bits(), b.p99_ms.to_bits());
            prop_assert_eq!(a.p50_ms.to_bits(), b.p50_ms.to_bits());
            prop_assert_eq!(a.min_ms.to_bits(), b.min_ms.to_bits());
            prop_assert_eq!(a.max_ms.to_bits(), b.max_ms.to_bits());
        }

        /// p0 and p100 are the endpoints
        #[test]
        fn extreme_percentiles_are_endpoints(samples in generators::sample_vectors()) {
            let sorted = sorted_samples(&samples);
            prop_assert_eq!(percentile_sorted(&sorted, 0.0), Some(sorted[0]));
            prop_assert_eq!(percentile_sorted(&sorted, 100.0), Some(sorted[sorted.len() - 1]));
        }
    }
}

/// Edge cases and boundary conditions
mod edge_case_tests {
    use super::*;

    #[test]
    fn test_constant_samples() {
        let stats = summarize(&[4.0; 17]).unwrap();
        assert_eq!(stats.min_ms, 4.0);
        assert_eq!(stats.p50_ms, 4.0);
        assert_eq!(stats.p99_ms, 4.0);
        assert_eq!(stats.max_ms, 4.0);
    }

    #[test]
    fn test_two_samples_interpolation() {
        // k = 1 * 0.99 = 0.99
        let stats = summarize(&[10.0, 20.0]).unwrap();
        assert!((stats.p99_ms - 19.9).abs() < 1e-9);
        assert!((stats.p50_ms - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_hundred_samples_p99() {
        let samples: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let stats = summarize(&samples).unwrap();
        // k = 99 * 0.99 = 98.01 -> 99 + (100 - 99) * 0.01
        assert!((stats.p99_ms - 99.01).abs() < 1e-9);
        assert!((stats.avg_ms - 50.5).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_samples_does_not_mutate_input() {
        let samples = vec![3.0, 1.0, 2.0];
        let sorted = sorted_samples(&samples);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
        assert_eq!(samples, vec![3.0, 1.0, 2.0]);
    }
}
