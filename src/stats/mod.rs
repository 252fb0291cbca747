// Statistics engine for A/B benchmark comparisons
//
// Reduces a Sample Set (ordered durations in milliseconds) to a Statistics
// Record, and two records to a conclusive/inconclusive Verdict. The same
// functions back the report builder, the converter and the runner's console
// summary so every consumer of a sample set sees identical numbers.
//
// Degenerate inputs never fail: an empty run still yields a well-defined
// all-zero record so a report can always be produced.

mod comparison;
mod summary;
mod verdict;

pub use comparison::{compare, gain_pct, Comparison};
pub use summary::{compute_stats, SampleStats};
pub use verdict::{
    determine_verdict, Verdict, CONCLUSIVE_CV_PCT, INCONCLUSIVE_CV_PCT,
};

#[cfg(test)]
mod tests;
