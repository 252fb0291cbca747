// Stability verdict from two statistics records
//
// Three branches, evaluated in order:
//   1. both CV% < 5.0         -> conclusive
//   2. either CV% > 15.0      -> inconclusive
//   3. otherwise              -> conclusive
// Comparisons are strict, so exactly 5.0 and exactly 15.0 land in branch 3.

use crate::stats::summary::SampleStats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Both sides below this CV% are stable
pub const CONCLUSIVE_CV_PCT: f64 = 5.0;

/// Either side above this CV% is too noisy to trust
pub const INCONCLUSIVE_CV_PCT: f64 = 15.0;

/// Whether a measured gain is trustworthy given the measurement noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Conclusive,
    Inconclusive,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Conclusive => write!(f, "conclusive"),
            Verdict::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// Classify a baseline/optimized pair by coefficient of variation
pub fn determine_verdict(baseline: &SampleStats, optimized: &SampleStats) -> Verdict {
    if baseline.cv_pct < CONCLUSIVE_CV_PCT && optimized.cv_pct < CONCLUSIVE_CV_PCT {
        Verdict::Conclusive
    } else if baseline.cv_pct > INCONCLUSIVE_CV_PCT || optimized.cv_pct > INCONCLUSIVE_CV_PCT {
        Verdict::Inconclusive
    } else {
        Verdict::Conclusive
    }
}
