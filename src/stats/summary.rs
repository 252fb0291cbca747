// Descriptive statistics over a single sample set
//
// Median and percentiles come from a sorted copy; the canonical sequence is
// never reordered. Mean and variance use compensated summation so the result
// does not drift with input order.

use serde::{Deserialize, Serialize};

/// Statistics Record for one (implementation, variant) sample set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub median: f64,
    pub mean: f64,
    /// Sample standard deviation (Bessel-corrected), 0 when n <= 1
    pub std: f64,
    /// Coefficient of variation in percent, 0 when mean <= 0
    pub cv_pct: f64,
    /// Nearest-rank 10th percentile, index floor(n * 0.1) of the sorted copy
    pub p10: f64,
    /// Nearest-rank 90th percentile, index floor(n * 0.9) of the sorted copy
    pub p90: f64,
}

/// Neumaier compensated sum
fn stable_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Median of an already sorted, non-empty slice
fn sorted_median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 0 {
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile without interpolation
fn nearest_rank(sorted: &[f64], fraction: f64) -> f64 {
    let idx = (sorted.len() as f64 * fraction).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn max_abs(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// Mean of a non-empty slice; falls back to a scaled sum when the plain sum overflows
fn sample_mean(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let mean = stable_sum(samples.iter().copied()) / n;
    if mean.is_finite() {
        return mean;
    }
    let scale = max_abs(samples);
    stable_sum(samples.iter().map(|x| x / scale)) / n * scale
}

/// Compute the Statistics Record for a sample set
///
/// # Example
/// ```
/// use chainbench::stats::compute_stats;
///
/// let stats = compute_stats(&[10.0, 12.0, 11.0, 13.0]);
/// assert_eq!(stats.median, 11.5);
/// assert_eq!(stats.mean, 11.5);
/// assert_eq!(stats.p10, 10.0);
/// assert_eq!(stats.p90, 13.0);
/// ```
pub fn compute_stats(samples: &[f64]) -> SampleStats {
    let n = samples.len();
    if n == 0 {
        return SampleStats::default();
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = sample_mean(samples);

    let std = if n > 1 {
        let sq = stable_sum(samples.iter().map(|x| (x - mean) * (x - mean)));
        if sq.is_finite() {
            (sq / (n - 1) as f64).sqrt()
        } else {
            // Squared deviations overflowed; redo the sum in units of the largest magnitude
            let scale = max_abs(samples);
            let scaled_mean = mean / scale;
            let sq = stable_sum(samples.iter().map(|x| {
                let dev = x / scale - scaled_mean;
                dev * dev
            }));
            (sq / (n - 1) as f64).sqrt() * scale
        }
    } else {
        0.0
    };

    let cv_pct = if mean > 0.0 { std / mean * 100.0 } else { 0.0 };

    SampleStats {
        median: sorted_median(&sorted),
        mean,
        std,
        cv_pct,
        p10: nearest_rank(&sorted, 0.1),
        p90: nearest_rank(&sorted, 0.9),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_length() {
        assert_eq!(compute_stats(&[9.0, 1.0, 5.0, 7.0, 3.0]).median, 5.0);
    }

    #[test]
    fn test_median_even_length() {
        assert_eq!(compute_stats(&[4.0, 1.0, 3.0, 2.0]).median, 2.5);
    }

    #[test]
    fn test_sample_std_uses_bessel_correction() {
        // mean=5, squared deviations sum to 20, divisor n-1 = 3
        let stats = compute_stats(&[2.0, 4.0, 6.0, 8.0]);
        assert!((stats.std - (20.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_input_is_not_reordered() {
        let samples = vec![3.0, 1.0, 2.0];
        let _ = compute_stats(&samples);
        assert_eq!(samples, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_percentile_indices() {
        // n=10: p10 -> index 1, p90 -> index 9
        let samples: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = compute_stats(&samples);
        assert_eq!(stats.p10, 2.0);
        assert_eq!(stats.p90, 10.0);

        // n=5: p10 -> index 0, p90 -> index 4
        let stats = compute_stats(&[50.0, 10.0, 40.0, 20.0, 30.0]);
        assert_eq!(stats.p10, 10.0);
        assert_eq!(stats.p90, 50.0);
    }

    #[test]
    fn test_cv_zero_for_non_positive_mean() {
        let stats = compute_stats(&[-1.0, -3.0]);
        assert!(stats.std > 0.0);
        assert_eq!(stats.cv_pct, 0.0);
    }

    #[test]
    fn test_huge_finite_samples_stay_finite() {
        let stats = compute_stats(&[1e308; 3]);
        assert_eq!(stats.mean, 1e308);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.cv_pct, 0.0);

        let stats = compute_stats(&[1e308, -1e308, 1e308]);
        assert!(stats.mean.is_finite());
        assert!(stats.std.is_finite() && stats.std > 0.0);

        assert_eq!(compute_stats(&[f64::MAX, f64::MAX]).median, f64::MAX);
    }

    #[test]
    fn test_stable_sum_compensates() {
        let values = [1e16, 1.0, -1e16];
        assert_eq!(stable_sum(values), 1.0);
    }
}
