// Baseline vs optimized comparison shared by every report producer

use crate::stats::summary::{compute_stats, SampleStats};
use crate::stats::verdict::{determine_verdict, Verdict};

/// Both statistics records plus the derived delta, gain and verdict
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub baseline: SampleStats,
    pub optimized: SampleStats,
    /// `baseline.median - optimized.median`; negative means a regression
    pub delta_ms: f64,
    pub gain_pct: f64,
    pub verdict: Verdict,
}

/// Gain of `delta_ms` relative to the baseline median, 0 when that median is not positive
pub fn gain_pct(delta_ms: f64, baseline_median: f64) -> f64 {
    if baseline_median > 0.0 {
        delta_ms / baseline_median * 100.0
    } else {
        0.0
    }
}

/// Reduce two sample sets to a comparison
pub fn compare(baseline_samples: &[f64], optimized_samples: &[f64]) -> Comparison {
    let baseline = compute_stats(baseline_samples);
    let optimized = compute_stats(optimized_samples);
    let delta_ms = baseline.median - optimized.median;

    Comparison {
        baseline,
        optimized,
        delta_ms,
        gain_pct: gain_pct(delta_ms, baseline.median),
        verdict: determine_verdict(&baseline, &optimized),
    }
}
