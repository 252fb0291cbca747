//! Property-based tests for the dataset, statistics and impact layers
//!
//! Core properties:
//! 1. Generated datasets always verify; any byte flip breaks verification
//! 2. Statistics are permutation invariant and order p10 <= median <= p90
//! 3. The verdict follows the coefficient-of-variation thresholds
//! 4. Impact projections scale linearly with the measured delta under any config

use chainbench::dataset::{generate_dataset, verify_dataset, DatasetParams, EMBEDDINGS_FILE};
use chainbench::impact::{project, ImpactConfig};
use chainbench::stats::{compute_stats, determine_verdict, SampleStats, Verdict};
use proptest::prelude::*;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_generated_dataset_verifies(
        n in 1i64..16,
        m in 1i64..6,
        d in 1i64..8,
        seed in any::<u64>(),
    ) {
        let tmp = TempDir::new().unwrap();
        let params = DatasetParams { n, m, d, seed };
        let metadata = generate_dataset(&params, tmp.path(), false).unwrap();

        let outcome = verify_dataset(tmp.path());
        prop_assert!(outcome.valid, "{:?}", outcome.reason);
        prop_assert_eq!(outcome.hash, Some(metadata.hash_sha256));
    }

    #[test]
    fn prop_any_byte_flip_breaks_verification(
        seed in any::<u64>(),
        position in 0usize..(8 * 4 * 3),
        mask in 1u8..=255,
    ) {
        let tmp = TempDir::new().unwrap();
        let params = DatasetParams { n: 4, m: 2, d: 3, seed };
        generate_dataset(&params, tmp.path(), false).unwrap();

        let path = tmp.path().join(EMBEDDINGS_FILE);
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[position] ^= mask;
        std::fs::write(&path, bytes).unwrap();

        prop_assert!(!verify_dataset(tmp.path()).valid);
    }

    #[test]
    fn prop_same_seed_same_hash(seed in any::<u64>()) {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let params = DatasetParams { n: 5, m: 2, d: 3, seed };
        let first = generate_dataset(&params, a.path(), false).unwrap();
        let second = generate_dataset(&params, b.path(), false).unwrap();
        prop_assert_eq!(first.hash_sha256, second.hash_sha256);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_stats_permutation_invariant(
        (samples, shuffled) in prop::collection::vec(1.0f64..10_000.0, 1..64)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let original = compute_stats(&samples);
        let permuted = compute_stats(&shuffled);

        prop_assert_eq!(original.median, permuted.median);
        prop_assert_eq!(original.p10, permuted.p10);
        prop_assert_eq!(original.p90, permuted.p90);
        prop_assert!((original.mean - permuted.mean).abs() <= 1e-9 * original.mean.abs());
        prop_assert!((original.std - permuted.std).abs() <= 1e-6 * (1.0 + original.std));
    }

    #[test]
    fn prop_stats_ordering(samples in prop::collection::vec(-1e6f64..1e6, 1..64)) {
        let stats = compute_stats(&samples);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        prop_assert!(stats.p10 <= stats.median);
        prop_assert!(stats.median <= stats.p90);
        prop_assert!(min <= stats.p10 && stats.p90 <= max);
        prop_assert!(stats.std >= 0.0);
        prop_assert!(stats.cv_pct >= 0.0);
    }

    #[test]
    fn prop_median_splits_sample(samples in prop::collection::vec(0.0f64..1e4, 1..64)) {
        let median = compute_stats(&samples).median;
        let below = samples.iter().filter(|&&x| x <= median).count();
        let above = samples.iter().filter(|&&x| x >= median).count();
        prop_assert!(below * 2 >= samples.len());
        prop_assert!(above * 2 >= samples.len());
    }

    #[test]
    fn prop_constant_samples_have_zero_spread(value in 0.1f64..1e5, len in 1usize..40) {
        let stats = compute_stats(&vec![value; len]);
        prop_assert_eq!(stats.median, value);
        prop_assert_eq!(stats.p10, value);
        prop_assert_eq!(stats.p90, value);
        prop_assert!(stats.cv_pct < 1e-9);
    }

    #[test]
    fn prop_verdict_thresholds(a in 0.0f64..30.0, b in 0.0f64..30.0) {
        let with_cv = |cv_pct| SampleStats { cv_pct, ..SampleStats::default() };
        let verdict = determine_verdict(&with_cv(a), &with_cv(b));

        let expected = if a < 5.0 && b < 5.0 {
            Verdict::Conclusive
        } else if a > 15.0 || b > 15.0 {
            Verdict::Inconclusive
        } else {
            Verdict::Conclusive
        };
        prop_assert_eq!(verdict, expected);
        // Symmetric in its arguments
        prop_assert_eq!(verdict, determine_verdict(&with_cv(b), &with_cv(a)));
    }

    #[test]
    fn prop_impact_linear_in_delta(
        delta in -1e4f64..1e4,
        factor in 0.0f64..10.0,
        executions_per_day in 1u64..100_000,
        days_per_year in 1u64..=366,
        cost_per_hour_eur in 0.0f64..100.0,
        electricity_kwh_per_hour in 0.0f64..10.0,
        co2_kg_per_kwh in 0.0f64..2.0,
    ) {
        let config = ImpactConfig {
            executions_per_day,
            days_per_year,
            cost_per_hour_eur,
            electricity_kwh_per_hour,
            co2_kg_per_kwh,
            ..ImpactConfig::default()
        };
        let single = project(delta, &config);

        // Doubling is exact in binary floating point, so every figure doubles exactly
        let doubled = project(2.0 * delta, &config);
        prop_assert_eq!(doubled.time_saved_hours_per_year, 2.0 * single.time_saved_hours_per_year);
        prop_assert_eq!(doubled.cost_saved_eur_per_year, 2.0 * single.cost_saved_eur_per_year);
        prop_assert_eq!(
            doubled.electricity_saved_kwh_per_year,
            2.0 * single.electricity_saved_kwh_per_year
        );
        prop_assert_eq!(doubled.co2_avoided_kg_per_year, 2.0 * single.co2_avoided_kg_per_year);

        let scaled = project(delta * factor, &config);
        let expected_cost = single.cost_saved_eur_per_year * factor;
        let tolerance = 1e-9 * (1.0 + expected_cost.abs());
        prop_assert!((scaled.cost_saved_eur_per_year - expected_cost).abs() <= tolerance);

        let negated = project(-delta, &config);
        prop_assert_eq!(negated.time_saved_hours_per_year, -single.time_saved_hours_per_year);
        prop_assert_eq!(negated.cost_saved_eur_per_year, -single.cost_saved_eur_per_year);
        // Savings and avoided CO2 always share a sign
        prop_assert!(single.time_saved_hours_per_year * single.co2_avoided_kg_per_year >= 0.0);
    }
}
