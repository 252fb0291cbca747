// Scenario tests for the statistics engine
//
// Exercises the degenerate inputs, the verdict boundaries and the canonical
// naive-vs-vectorised comparison end to end.

use super::*;

fn with_cv(cv_pct: f64) -> SampleStats {
    SampleStats {
        median: 100.0,
        mean: 100.0,
        std: cv_pct,
        cv_pct,
        p10: 100.0,
        p90: 100.0,
    }
}

#[test]
fn test_empty_samples_yield_zero_record() {
    assert_eq!(compute_stats(&[]), SampleStats::default());
    let stats = compute_stats(&[]);
    assert_eq!(stats.median, 0.0);
    assert_eq!(stats.mean, 0.0);
    assert_eq!(stats.std, 0.0);
    assert_eq!(stats.cv_pct, 0.0);
    assert_eq!(stats.p10, 0.0);
    assert_eq!(stats.p90, 0.0);
}

#[test]
fn test_single_sample() {
    let stats = compute_stats(&[42.5]);
    assert_eq!(stats.median, 42.5);
    assert_eq!(stats.mean, 42.5);
    assert_eq!(stats.std, 0.0);
    assert_eq!(stats.cv_pct, 0.0);
    assert_eq!(stats.p10, 42.5);
    assert_eq!(stats.p90, 42.5);
}

#[test]
fn test_verdict_both_stable() {
    assert_eq!(
        determine_verdict(&with_cv(4.9), &with_cv(4.9)),
        Verdict::Conclusive
    );
}

#[test]
fn test_verdict_one_side_too_noisy() {
    assert_eq!(
        determine_verdict(&with_cv(5.1), &with_cv(16.0)),
        Verdict::Inconclusive
    );
    assert_eq!(
        determine_verdict(&with_cv(16.0), &with_cv(1.0)),
        Verdict::Inconclusive
    );
}

#[test]
fn test_verdict_tolerant_middle_band() {
    assert_eq!(
        determine_verdict(&with_cv(5.1), &with_cv(10.0)),
        Verdict::Conclusive
    );
}

#[test]
fn test_verdict_boundaries_route_to_middle_branch() {
    assert_eq!(
        determine_verdict(&with_cv(5.1), &with_cv(15.0)),
        Verdict::Conclusive
    );
    assert_eq!(
        determine_verdict(&with_cv(5.0), &with_cv(5.0)),
        Verdict::Conclusive
    );
    assert_eq!(
        determine_verdict(&with_cv(15.0), &with_cv(15.0)),
        Verdict::Conclusive
    );
    assert_eq!(
        determine_verdict(&with_cv(15.000001), &with_cv(0.0)),
        Verdict::Inconclusive
    );
}

/// Degenerate identical runs: naive loop at 1520 ms vs vectorised at 1212 ms
#[test]
fn test_identical_runs_end_to_end() {
    let baseline = vec![1520.0; 30];
    let optimized = vec![1212.0; 30];

    let cmp = compare(&baseline, &optimized);

    assert_eq!(cmp.baseline.cv_pct, 0.0);
    assert_eq!(cmp.optimized.cv_pct, 0.0);
    assert_eq!(cmp.verdict, Verdict::Conclusive);
    assert_eq!(cmp.delta_ms, 308.0);
    assert!((cmp.gain_pct - 20.263157894736842).abs() < 1e-9);
}

#[test]
fn test_regression_gives_negative_delta() {
    let cmp = compare(&[100.0, 101.0, 99.0], &[120.0, 121.0, 119.0]);
    assert_eq!(cmp.delta_ms, -20.0);
    assert!(cmp.gain_pct < 0.0);
}

#[test]
fn test_gain_zero_when_baseline_empty() {
    let cmp = compare(&[], &[10.0, 11.0]);
    assert_eq!(cmp.baseline.median, 0.0);
    assert_eq!(cmp.gain_pct, 0.0);
    assert_eq!(cmp.delta_ms, -10.5);
    assert_eq!(gain_pct(5.0, -1.0), 0.0);
}

#[test]
fn test_noisy_samples_are_inconclusive() {
    // CV well above 15%
    let cmp = compare(&[100.0, 150.0, 60.0, 140.0, 70.0], &[50.0, 51.0, 49.0]);
    assert!(cmp.baseline.cv_pct > INCONCLUSIVE_CV_PCT);
    assert_eq!(cmp.verdict, Verdict::Inconclusive);
}
