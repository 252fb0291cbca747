//! Benchmark runner: dataset pre-flight, sampling and result persistence
//!
//! The built-in workload produces deterministic mock timings, so every
//! downstream artifact (CSV, summary, report) is reproducible byte for byte.

use crate::csv_output::ResultsCsv;
use crate::dataset::{self, normal_draw, DatasetMetadata};
use crate::error::{BenchError, Result};
use crate::profiler::{ProcfsProbe, ResourceProfile, ResourceProfiler};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const RESULTS_CSV_FILE: &str = "results.csv";
pub const SUMMARY_JSON_FILE: &str = "summary.json";

const MOCK_SEED_BASE: u64 = 42;
const MOCK_NOISE_MS: f64 = 6.0;
const NAIVE_BASE_MS: f64 = 1520.0;
const OPTIMIZED_BASE_MS: f64 = 1212.0;
const STABILITY_SETTLE: Duration = Duration::from_secs(2);
const PROFILE_INTERVAL: Duration = Duration::from_millis(100);

/// What to do when the environment is not stable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StabilityMode {
    /// Wait for the system to settle before measuring
    #[default]
    Wait,
    /// Measure immediately
    Skip,
    /// Settle, then measure; reserved for aborting on instability
    Fail,
}

impl StabilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityMode::Wait => "wait",
            StabilityMode::Skip => "skip",
            StabilityMode::Fail => "fail",
        }
    }
}

/// Let the system settle; returns the seconds waited
///
/// The settle period is capped by `timeout`.
pub fn check_stability(timeout: Duration, mode: StabilityMode) -> f64 {
    if mode == StabilityMode::Skip {
        return 0.0;
    }
    let start = Instant::now();
    std::thread::sleep(STABILITY_SETTLE.min(timeout));
    let waited = start.elapsed().as_secs_f64();
    info!("System stable (waited {:.1}s)", waited);
    waited
}

const NUMERIC_THREAD_VARS: [&str; 4] = [
    "OMP_NUM_THREADS",
    "MKL_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "NUMEXPR_NUM_THREADS",
];

/// Thread-count variables of the numeric libraries, each pinned to 1
pub fn numeric_library_env() -> BTreeMap<String, String> {
    NUMERIC_THREAD_VARS
        .into_iter()
        .map(|k| (k.to_string(), "1".to_string()))
        .collect()
}

/// Everything exported when single-threaded execution is enforced
pub fn single_thread_env() -> BTreeMap<String, String> {
    let mut env = numeric_library_env();
    env.insert("GOMAXPROCS".to_string(), "1".to_string());
    env
}

/// An implementation under test, written `language-variant` on the command line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplSpec {
    pub name: String,
    pub variant: String,
}

impl ImplSpec {
    pub fn new(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: variant.into(),
        }
    }

    /// Parse `python-naive` into (`python`, `naive`)
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.trim().split('-').collect();
        match parts.as_slice() {
            [name, variant] if !name.is_empty() && !variant.is_empty() => {
                Ok(Self::new(*name, *variant))
            }
            _ => Err(BenchError::MalformedInput(format!(
                "invalid implementation format '{}', expected language-variant (e.g. python-naive)",
                spec.trim()
            ))),
        }
    }

    /// `name/variant`, the key used in summaries and logs
    pub fn key(&self) -> String {
        format!("{}/{}", self.name, self.variant)
    }
}

/// Parse a comma separated implementation list
pub fn parse_impls(list: &str) -> Result<Vec<ImplSpec>> {
    let impls = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(ImplSpec::parse)
        .collect::<Result<Vec<_>>>()?;
    if impls.is_empty() {
        return Err(BenchError::MalformedInput(
            "no implementations given".to_string(),
        ));
    }
    Ok(impls)
}

/// Runner configuration, persisted verbatim as `config` in the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub warmup: u32,
    pub runs: u32,
    pub repeat: u32,
    pub stability_enabled: bool,
    pub stability_mode: StabilityMode,
    pub waited_seconds: f64,
    pub cpu_affinity: Option<u32>,
    pub enforce_single_thread: bool,
    pub ebpf_agent: Option<String>,
    /// Sample CPU/RAM/I/O while each implementation runs
    pub profile_resources: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup: 5,
            runs: 30,
            repeat: 50,
            stability_enabled: false,
            stability_mode: StabilityMode::Wait,
            waited_seconds: 0.0,
            cpu_affinity: None,
            enforce_single_thread: false,
            ebpf_agent: None,
            profile_resources: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(BenchError::InvalidParameters(
                "runs must be >= 1".to_string(),
            ));
        }
        if self.repeat == 0 {
            return Err(BenchError::InvalidParameters(
                "repeat must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runner summary (`summary.json`), the input contract of the report builder
///
/// Every field is optional on read so partial summaries still build a report.
/// `metadata` and `config` are carried as opaque JSON: nothing downstream
/// reads them, so their shape is never enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSummary {
    pub metadata: Option<serde_json::Value>,
    pub config: Option<serde_json::Value>,
    pub baseline_samples: Vec<f64>,
    pub optimized_samples: Vec<f64>,
    pub warmup: Option<u32>,
    pub runs: Option<u32>,
    pub repeat: Option<u32>,
    pub stability_enabled: Option<bool>,
    pub stability_mode: Option<String>,
    pub waited_seconds: Option<f64>,
    pub cpu_affinity: Option<u32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_profiles: BTreeMap<String, ResourceProfile>,
}

impl RunnerSummary {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BenchError::MalformedInput(format!("runner summary: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
        Self::from_json_str(&content)
    }
}

/// Samples (and optional resource profile) for one implementation
#[derive(Debug, Clone, PartialEq)]
pub struct ImplResult {
    pub spec: ImplSpec,
    pub samples: Vec<f64>,
    pub profile: Option<ResourceProfile>,
}

/// Results of a benchmark session, in the order implementations were given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkResults {
    pub entries: Vec<ImplResult>,
}

impl BenchmarkResults {
    /// First implementation
    pub fn baseline(&self) -> Option<&ImplResult> {
        self.entries.first()
    }

    /// Second implementation, or the baseline again when only one ran
    pub fn optimized(&self) -> Option<&ImplResult> {
        self.entries.get(1).or_else(|| self.entries.first())
    }
}

/// Deterministic mock timings for `variant`
///
/// Each run draws its noise from a fresh generator seeded with `42 + run`, so
/// run `i` has the same duration no matter how many runs precede it.
pub fn mock_samples(variant: &str, runs: u32) -> Vec<f64> {
    let base = if variant == "naive" {
        NAIVE_BASE_MS
    } else {
        OPTIMIZED_BASE_MS
    };
    (0..runs)
        .map(|run| {
            let mut rng = StdRng::seed_from_u64(MOCK_SEED_BASE + u64::from(run));
            base + MOCK_NOISE_MS * normal_draw(&mut rng)
        })
        .collect()
}

fn run_impl(spec: &ImplSpec, config: &RunConfig) -> Vec<f64> {
    info!("Running {}", spec.key());
    if config.enforce_single_thread {
        for (key, value) in single_thread_env() {
            debug!("{}={}", key, value);
        }
    }
    if let Some(cpu) = config.cpu_affinity {
        debug!("Pinned to CPU {}", cpu);
    }

    for i in 0..config.warmup {
        let duration_ms = 1500.0 + f64::from(i % 3) * 10.0;
        debug!("Warmup {}/{}: {:.1}ms", i + 1, config.warmup, duration_ms);
    }

    let samples = mock_samples(&spec.variant, config.runs);
    for (run, duration) in samples.iter().enumerate() {
        if (run + 1) % 10 == 0 {
            debug!("Progress {}/{} runs ({:.1}ms)", run + 1, config.runs, duration);
        }
    }
    samples
}

/// Verify the dataset lock, then sample every implementation in order
///
/// # Errors
/// Lock failures (`NotFound`, `IntegrityMismatch`) abort before any timing.
pub fn run_benchmarks(
    metadata: &DatasetMetadata,
    data_dir: &Path,
    impls: &[ImplSpec],
    config: &RunConfig,
) -> Result<BenchmarkResults> {
    config.validate()?;
    dataset::verify_dataset_lock(metadata, data_dir)?;
    info!("Dataset verified: {}", metadata.hash_sha256);

    let mut results = BenchmarkResults::default();
    for spec in impls {
        let (samples, profile) = if config.profile_resources {
            let (samples, profiled) =
                ResourceProfiler::profile(ProcfsProbe::new(), PROFILE_INTERVAL, || {
                    run_impl(spec, config)
                });
            (samples, Some(profiled.profile()))
        } else {
            (run_impl(spec, config), None)
        };

        results.entries.push(ImplResult {
            spec: spec.clone(),
            samples,
            profile,
        });
    }
    Ok(results)
}

/// Paths written by `save_results`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedResults {
    pub results_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Build the summary persisted next to the CSV
pub fn build_summary(
    results: &BenchmarkResults,
    metadata: &DatasetMetadata,
    config: &RunConfig,
) -> RunnerSummary {
    let samples_of = |r: Option<&ImplResult>| r.map(|r| r.samples.clone()).unwrap_or_default();

    RunnerSummary {
        metadata: serde_json::to_value(metadata).ok(),
        config: serde_json::to_value(config).ok(),
        baseline_samples: samples_of(results.baseline()),
        optimized_samples: samples_of(results.optimized()),
        warmup: Some(config.warmup),
        runs: Some(config.runs),
        repeat: Some(config.repeat),
        stability_enabled: Some(config.stability_enabled),
        stability_mode: Some(config.stability_mode.as_str().to_string()),
        waited_seconds: Some(config.waited_seconds),
        cpu_affinity: config.cpu_affinity,
        resource_profiles: results
            .entries
            .iter()
            .filter_map(|r| r.profile.clone().map(|p| (r.spec.key(), p)))
            .collect(),
    }
}

/// Write `results.csv` and `summary.json` into `out_dir`
pub fn save_results(
    results: &BenchmarkResults,
    out_dir: &Path,
    metadata: &DatasetMetadata,
    config: &RunConfig,
) -> Result<SavedResults> {
    fs::create_dir_all(out_dir)?;

    let mut csv = ResultsCsv::new();
    for entry in &results.entries {
        csv.add_samples(&entry.spec.name, &entry.spec.variant, &entry.samples);
    }
    let results_csv = out_dir.join(RESULTS_CSV_FILE);
    fs::write(&results_csv, csv.to_csv())?;
    info!("Saved results to {}", results_csv.display());

    let summary = build_summary(results, metadata, config);
    let summary_json = out_dir.join(SUMMARY_JSON_FILE);
    fs::write(&summary_json, serde_json::to_string_pretty(&summary)?)?;
    info!("Saved summary to {}", summary_json.display());

    Ok(SavedResults {
        results_csv,
        summary_json,
    })
}
