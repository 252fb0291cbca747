//! Converter from multi-implementation result tables to the report schema
//!
//! Some harnesses only record a single CPU time per implementation. The
//! converter expands each selected entry into a synthetic sample set (0.5% CV
//! around the recorded time), then runs it through the same statistics,
//! verdict and impact code as the regular report builder.

use crate::dataset::normal_draw;
use crate::error::{BenchError, Result};
use crate::profiler::{ProfileCurve, ResourceProfile, ResourceSummary};
use crate::report::{
    build_report_with, Artifacts, DatasetSnapshot, Report, ReportContext, ReportInputs,
};
use crate::runner::{ImplSpec, RunnerSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const SAMPLE_SEED: u64 = 42;
const SAMPLE_COUNT: usize = 30;
const SAMPLE_CV: f64 = 0.005;
const MIN_SAMPLE_MS: f64 = 0.1;
const PROFILE_POINTS: usize = 50;

/// One implementation's row in the input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterEntry {
    pub implementation: String,
    pub code_language: String,
    pub cpu_processing_time_ms: f64,
    pub cpu_usage_percent: f64,
    pub max_ram_mb: f64,
    pub speedup_vs_baseline: f64,
    #[serde(default)]
    pub cores_used: Option<u32>,
}

/// Input document: `{source_summary?, entries: [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterInput {
    #[serde(default)]
    pub source_summary: Option<String>,
    pub entries: Vec<ConverterEntry>,
}

impl ConverterInput {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BenchError::MalformedInput(format!("converter input: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
        Self::from_json_str(&content)
    }
}

/// Find the entry whose `implementation` matches `name`
pub fn find_entry<'a>(entries: &'a [ConverterEntry], name: &str) -> Result<&'a ConverterEntry> {
    entries
        .iter()
        .find(|e| e.implementation == name)
        .ok_or_else(|| BenchError::LookupFailure(name.to_string()))
}

/// Synthetic samples around `mean_ms` with a 0.5% coefficient of variation
pub fn mock_samples<R: Rng>(mean_ms: f64, count: usize, rng: &mut R) -> Vec<f64> {
    let std = mean_ms * SAMPLE_CV;
    (0..count)
        .map(|_| (mean_ms + std * normal_draw(rng)).max(MIN_SAMPLE_MS))
        .collect()
}

/// Stable seed per implementation name
fn name_seed(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// 50-point synthetic profile built from the entry's CPU and RAM averages
pub fn synthetic_profile<R: Rng>(entry: &ConverterEntry, rng: &mut R) -> ResourceProfile {
    let cpu_avg = entry.cpu_usage_percent;
    let ram_avg = entry.max_ram_mb;

    let timestamps: Vec<f64> = (0..PROFILE_POINTS).map(|i| (i * 2) as f64).collect();
    let cpu: Vec<f64> = (0..PROFILE_POINTS)
        .map(|_| (cpu_avg + 2.0 * normal_draw(rng)).clamp(0.0, 100.0))
        .collect();
    let ram: Vec<f64> = (0..PROFILE_POINTS)
        .map(|_| (ram_avg + ram_avg * 0.05 * normal_draw(rng)).max(0.0))
        .collect();
    let io: Vec<f64> = (0..PROFILE_POINTS)
        .map(|_| rng.gen_range(0.0..10.0))
        .collect();
    let gpu = vec![0.0; PROFILE_POINTS];

    ResourceProfile {
        summary: ResourceSummary {
            cpu_avg,
            cpu_max: cpu.iter().copied().fold(f64::MIN, f64::max),
            ram_avg_mb: ram_avg,
            ram_max_mb: ram.iter().copied().fold(f64::MIN, f64::max),
            io_total_mb: io.iter().sum(),
            gpu_avg: 0.0,
            duration_ms: entry.cpu_processing_time_ms,
            sample_count: PROFILE_POINTS,
        },
        curve: ProfileCurve {
            timestamps,
            cpu,
            ram,
            io,
            gpu,
        },
    }
}

/// Snapshot used when the caller has no dataset descriptor
pub fn placeholder_dataset() -> DatasetSnapshot {
    DatasetSnapshot {
        hash_sha256: hex::encode(Sha256::digest(b"mock_dataset")),
        n: 2000,
        m: 15,
        d: 96,
        seed: 42,
    }
}

/// Convert with the current time and host
pub fn convert_to_report(
    input: &ConverterInput,
    baseline: &str,
    optimized: &str,
    dataset: Option<DatasetSnapshot>,
) -> Result<Report> {
    convert_to_report_with(input, baseline, optimized, dataset, ReportContext::capture())
}

/// Convert with an explicit time/host stamp
///
/// # Errors
/// `LookupFailure` when either implementation is missing from the entries.
pub fn convert_to_report_with(
    input: &ConverterInput,
    baseline: &str,
    optimized: &str,
    dataset: Option<DatasetSnapshot>,
    ctx: ReportContext,
) -> Result<Report> {
    let baseline_entry = find_entry(&input.entries, baseline)?;
    let optimized_entry = find_entry(&input.entries, optimized)?;

    // Each side gets a fresh generator with the same seed
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let baseline_samples =
        mock_samples(baseline_entry.cpu_processing_time_ms, SAMPLE_COUNT, &mut rng);
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let optimized_samples =
        mock_samples(optimized_entry.cpu_processing_time_ms, SAMPLE_COUNT, &mut rng);

    let summary = RunnerSummary {
        baseline_samples,
        optimized_samples,
        warmup: Some(5),
        runs: Some(SAMPLE_COUNT as u32),
        repeat: Some(50),
        stability_enabled: Some(true),
        stability_mode: Some("wait".to_string()),
        waited_seconds: Some(0.0),
        ..RunnerSummary::default()
    };

    let source = input
        .source_summary
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    let mut inputs = ReportInputs::new(
        &summary,
        dataset.unwrap_or_else(placeholder_dataset),
        ImplSpec::new(&baseline_entry.code_language, baseline),
        ImplSpec::new(&optimized_entry.code_language, optimized),
    );
    inputs.command_line = format!("Converted from {}", source);
    inputs.artifacts = Artifacts {
        results_csv: "converted/results.csv".to_string(),
        summary_json: source,
        ..Artifacts::default()
    };
    inputs.notes = Some(format!(
        "Converted from custom format. Speedup vs baseline: {:.2}x",
        optimized_entry.speedup_vs_baseline
    ));

    let mut report = build_report_with(inputs, ctx);
    // The table's core count is reported verbatim, zero included
    report.benchmark.cpu_affinity = baseline_entry.cores_used.unwrap_or(1);

    let profiles: BTreeMap<String, ResourceProfile> = input
        .entries
        .iter()
        .map(|entry| {
            let mut rng = StdRng::seed_from_u64(name_seed(&entry.implementation));
            (
                format!("{}/{}", entry.code_language, entry.implementation),
                synthetic_profile(entry, &mut rng),
            )
        })
        .collect();
    report.resource_profiles = Some(profiles);

    info!(
        "Converted {} vs {} ({} entries)",
        baseline,
        optimized,
        input.entries.len()
    );
    Ok(report)
}
