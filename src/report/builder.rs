//! Report assembly
//!
//! `build_report` stamps the current time and host; `build_report_with` takes
//! them explicitly so identical inputs can be rebuilt deterministically.

use crate::error::{BenchError, Result};
use crate::impact::{self, ImpactConfig};
use crate::report::machine::{self, MachineInfo};
use crate::report::schema::{
    Artifacts, BenchmarkInfo, DatasetSnapshot, Impact, Report, ReportMeta, RunRecord, Runs,
    SingleThread, StabilityInfo, Summary, SCHEMA_VERSION,
};
use crate::runner::{self, ImplSpec, RunnerSummary};
use crate::stats;
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_WARMUP: u32 = 5;
const DEFAULT_RUNS: u32 = 30;
const DEFAULT_REPEAT: u32 = 50;
const DEFAULT_CPU_AFFINITY: u32 = 2;
const DEFAULT_NOTES: &str = "Gain measured at environment constant (same machine).";
const REPORT_ID_LEN: usize = 16;

/// Everything a report is built from, apart from time and host
#[derive(Debug, Clone)]
pub struct ReportInputs<'a> {
    pub summary: &'a RunnerSummary,
    /// Telemetry evidence, passed through verbatim
    pub evidence: Option<serde_json::Value>,
    pub dataset: DatasetSnapshot,
    pub command_line: String,
    pub baseline: ImplSpec,
    pub optimized: ImplSpec,
    pub impact: ImpactConfig,
    pub artifacts: Artifacts,
    pub notes: Option<String>,
}

impl<'a> ReportInputs<'a> {
    /// Inputs with default impact constants, artifacts and notes
    pub fn new(
        summary: &'a RunnerSummary,
        dataset: DatasetSnapshot,
        baseline: ImplSpec,
        optimized: ImplSpec,
    ) -> Self {
        Self {
            summary,
            evidence: None,
            dataset,
            command_line: String::new(),
            baseline,
            optimized,
            impact: ImpactConfig::default(),
            artifacts: Artifacts::default(),
            notes: None,
        }
    }
}

/// Time and host a report is stamped with
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub generated_at: DateTime<Utc>,
    pub machine: MachineInfo,
    pub git_commit: Option<String>,
}

impl ReportContext {
    /// Capture the current time, host identity and git commit
    pub fn capture() -> Self {
        Self {
            generated_at: Utc::now(),
            machine: MachineInfo::detect(),
            git_commit: machine::git_commit(),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Session nonce: leading hex of SHA-256 over `generated_at || hostname`
///
/// Two reports with identical content but different generation times get
/// different ids.
pub fn report_id(generated_at: &str, hostname: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(generated_at.as_bytes());
    hasher.update(hostname.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(REPORT_ID_LEN);
    id
}

/// Build a report stamped with the current time and host
pub fn build_report(inputs: ReportInputs<'_>) -> Report {
    build_report_with(inputs, ReportContext::capture())
}

/// Build a report with an explicit stamp
pub fn build_report_with(inputs: ReportInputs<'_>, ctx: ReportContext) -> Report {
    let summary = inputs.summary;
    let cmp = stats::compare(&summary.baseline_samples, &summary.optimized_samples);
    let outputs = impact::project(cmp.delta_ms, &inputs.impact);

    let generated_at = format_timestamp(&ctx.generated_at);
    let id = report_id(&generated_at, &ctx.machine.hostname);
    debug!("Report id {} for {}", id, generated_at);

    let evidence = inputs
        .evidence
        .unwrap_or_else(|| json!({ "available": false }));

    let resource_profiles =
        (!summary.resource_profiles.is_empty()).then(|| summary.resource_profiles.clone());

    Report {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: ReportMeta {
            report_id: id,
            generated_at,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: ctx.git_commit,
            machine: ctx.machine,
            dataset: inputs.dataset,
        },
        benchmark: BenchmarkInfo {
            command_line: inputs.command_line,
            warmup: summary.warmup.unwrap_or(DEFAULT_WARMUP),
            runs: summary.runs.unwrap_or(DEFAULT_RUNS),
            repeat: summary.repeat.unwrap_or(DEFAULT_REPEAT),
            stability: StabilityInfo {
                enabled: summary.stability_enabled.unwrap_or(true),
                mode: summary
                    .stability_mode
                    .clone()
                    .unwrap_or_else(|| "wait".to_string()),
                waited_seconds: summary.waited_seconds.unwrap_or(0.0),
            },
            single_thread: SingleThread {
                env_vars: runner::numeric_library_env(),
            },
            cpu_affinity: summary
                .cpu_affinity
                .filter(|&cpu| cpu != 0)
                .unwrap_or(DEFAULT_CPU_AFFINITY),
            impls: vec![inputs.baseline.clone(), inputs.optimized.clone()],
        },
        runs: Runs {
            baseline: RunRecord::all_successful(&inputs.baseline, &summary.baseline_samples),
            optimized: RunRecord::all_successful(&inputs.optimized, &summary.optimized_samples),
        },
        summary: Summary {
            baseline_stats: cmp.baseline,
            optimized_stats: cmp.optimized,
            delta_ms: cmp.delta_ms,
            gain_pct: cmp.gain_pct,
            verdict: cmp.verdict,
            notes: inputs.notes.unwrap_or_else(|| DEFAULT_NOTES.to_string()),
        },
        evidence,
        impact: Impact {
            inputs: inputs.impact,
            outputs,
        },
        artifacts: inputs.artifacts,
        resource_profiles,
    }
}

/// Load telemetry evidence; a missing file means `{"available": false}`
pub fn load_evidence(path: Option<&Path>) -> Result<serde_json::Value> {
    let Some(path) = path.filter(|p| p.exists()) else {
        info!("No evidence file, recording evidence as unavailable");
        return Ok(json!({ "available": false }));
    };
    let content =
        std::fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
    serde_json::from_str(&content)
        .map_err(|e| BenchError::MalformedInput(format!("{}: {}", path.display(), e)))
}
