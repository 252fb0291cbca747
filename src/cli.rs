//! CLI argument parsing for ChainBench

use crate::runner::StabilityMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chainbench")]
#[command(version)]
#[command(about = "Reproducible A/B benchmarks over hash-locked datasets", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a synthetic dataset and its lock file, then verify it
    Generate(GenerateArgs),
    /// Recompute the dataset hash and compare it with the metadata
    Verify(VerifyArgs),
    /// Benchmark implementations against a locked dataset
    Run(RunArgs),
    /// Build report.json from a runner summary
    Report(ReportArgs),
    /// Convert a multi-implementation results file into report.json
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of embeddings
    #[arg(long = "n", visible_alias = "N", default_value_t = 2000, allow_negative_numbers = true)]
    pub n: i64,

    /// Number of axes
    #[arg(long = "m", visible_alias = "M", default_value_t = 15, allow_negative_numbers = true)]
    pub m: i64,

    /// Dimensions
    #[arg(long = "d", visible_alias = "D", default_value_t = 96, allow_negative_numbers = true)]
    pub d: i64,

    /// Random seed
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Output directory
    #[arg(long = "output", value_name = "DIR", default_value = "data")]
    pub output: PathBuf,

    /// Overwrite an existing dataset
    #[arg(long = "force")]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Dataset directory
    #[arg(long = "output", value_name = "DIR", default_value = "data")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the dataset metadata.json
    #[arg(long = "metadata", value_name = "FILE")]
    pub metadata: PathBuf,

    /// Comma separated implementations (e.g. python-naive,python-numpy)
    #[arg(long = "impls", value_name = "LIST")]
    pub impls: String,

    /// Number of warmup runs
    #[arg(long = "warmup", default_value_t = 5)]
    pub warmup: u32,

    /// Number of measured runs
    #[arg(long = "runs", default_value_t = 30)]
    pub runs: u32,

    /// Repetitions per run
    #[arg(long = "repeat", default_value_t = 50)]
    pub repeat: u32,

    /// Let the system settle before measuring
    #[arg(long = "stability-enable")]
    pub stability_enable: bool,

    /// Stability check mode
    #[arg(long = "stability-mode", value_enum, default_value = "wait")]
    pub stability_mode: StabilityMode,

    /// Stability check timeout in seconds
    #[arg(long = "stability-timeout", value_name = "SECS", default_value_t = 60)]
    pub stability_timeout: u64,

    /// Pin numeric libraries to a single thread
    #[arg(long = "enforce-single-thread")]
    pub enforce_single_thread: bool,

    /// Pin to a specific CPU core
    #[arg(long = "cpu-affinity", value_name = "CPU")]
    pub cpu_affinity: Option<u32>,

    /// Telemetry agent URL, recorded in the summary
    #[arg(long = "ebpf-agent", value_name = "URL")]
    pub ebpf_agent: Option<String>,

    /// Sample CPU/RAM/I/O from /proc while each implementation runs
    #[arg(long = "profile-resources")]
    pub profile_resources: bool,

    /// Output directory
    #[arg(long = "output", value_name = "DIR", default_value = "runner")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Path to the runner summary.json
    #[arg(long = "runner-summary", value_name = "FILE")]
    pub runner_summary: PathBuf,

    /// Path to the telemetry evidence.json
    #[arg(long = "ebpf-evidence", value_name = "FILE")]
    pub ebpf_evidence: Option<PathBuf>,

    /// Path to the dataset metadata.json
    #[arg(long = "metadata", value_name = "FILE")]
    pub metadata: PathBuf,

    /// Output report path
    #[arg(long = "output", value_name = "FILE", default_value = "report.json")]
    pub output: PathBuf,

    /// Full command line used for the benchmark
    #[arg(long = "command-line", default_value = "")]
    pub command_line: String,

    #[arg(long = "baseline-impl", default_value = "python")]
    pub baseline_impl: String,

    #[arg(long = "baseline-variant", default_value = "naive")]
    pub baseline_variant: String,

    #[arg(long = "optimized-impl", default_value = "python")]
    pub optimized_impl: String,

    #[arg(long = "optimized-variant", default_value = "numpy")]
    pub optimized_variant: String,

    /// TOML file overriding the impact constants
    #[arg(long = "impact-config", value_name = "FILE")]
    pub impact_config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input results JSON
    #[arg(long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Output report path
    #[arg(long = "output", value_name = "FILE", default_value = "report.json")]
    pub output: PathBuf,

    /// Baseline implementation name
    #[arg(long = "baseline")]
    pub baseline: String,

    /// Optimized implementation name
    #[arg(long = "optimized")]
    pub optimized: String,

    /// Dataset metadata.json to record instead of the placeholder descriptor
    #[arg(long = "metadata", value_name = "FILE")]
    pub metadata: Option<PathBuf>,
}
