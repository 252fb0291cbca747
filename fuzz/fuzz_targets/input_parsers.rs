#![no_main]

use chainbench::convert::ConverterInput;
use chainbench::csv_output::ResultsCsv;
use chainbench::runner::{parse_impls, RunnerSummary};
use chainbench::stats::compute_stats;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // None of the parsers may panic, whatever the input
        if let Ok(summary) = RunnerSummary::from_json_str(input) {
            let _ = compute_stats(&summary.baseline_samples);
            let _ = compute_stats(&summary.optimized_samples);
        }
        let _ = ConverterInput::from_json_str(input);
        if let Ok(csv) = ResultsCsv::parse(input) {
            let _ = csv.to_csv();
        }
        let _ = parse_impls(input);
    }
});
