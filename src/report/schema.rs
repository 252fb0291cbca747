//! Report schema (version 1.0.0)

use crate::dataset::DatasetMetadata;
use crate::error::{BenchError, Result};
use crate::impact::{ImpactConfig, ImpactProjection};
use crate::profiler::ResourceProfile;
use crate::report::machine::MachineInfo;
use crate::runner::ImplSpec;
use crate::stats::{SampleStats, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Complete benchmark report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub meta: ReportMeta,
    pub benchmark: BenchmarkInfo,
    pub runs: Runs,
    pub summary: Summary,
    /// Opaque evidence from the telemetry agent, or `{"available": false}`
    pub evidence: serde_json::Value,
    pub impact: Impact,
    pub artifacts: Artifacts,
    /// Per-implementation resource profiles, keyed `language/implementation`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_profiles: Option<BTreeMap<String, ResourceProfile>>,
}

/// Report identity and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Session nonce derived from generation time and host, not from content
    pub report_id: String,
    /// UTC, ISO-8601 with trailing `Z`
    pub generated_at: String,
    pub app_version: String,
    pub git_commit: Option<String>,
    pub machine: MachineInfo,
    pub dataset: DatasetSnapshot,
}

/// Dataset descriptor fields copied into the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub hash_sha256: String,
    #[serde(rename = "N")]
    pub n: u64,
    #[serde(rename = "M")]
    pub m: u64,
    #[serde(rename = "D")]
    pub d: u64,
    pub seed: u64,
}

impl From<&DatasetMetadata> for DatasetSnapshot {
    fn from(metadata: &DatasetMetadata) -> Self {
        Self {
            hash_sha256: metadata.hash_sha256.clone(),
            n: metadata.n,
            m: metadata.m,
            d: metadata.d,
            seed: metadata.seed,
        }
    }
}

/// How the benchmark was executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkInfo {
    pub command_line: String,
    pub warmup: u32,
    pub runs: u32,
    pub repeat: u32,
    pub stability: StabilityInfo,
    pub single_thread: SingleThread,
    pub cpu_affinity: u32,
    pub impls: Vec<ImplSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityInfo {
    pub enabled: bool,
    pub mode: String,
    pub waited_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleThread {
    pub env_vars: BTreeMap<String, String>,
}

/// Outcome of one measured run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// Failure cause for a run whose status is `Failure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub run: usize,
    pub cause: String,
}

/// Raw samples of one side of the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "impl")]
    pub implementation: String,
    pub variant: String,
    pub samples: Vec<f64>,
    pub status: Vec<RunStatus>,
    pub errors: Vec<RunError>,
}

impl RunRecord {
    /// Every sample that reached the report is recorded as a success
    pub fn all_successful(spec: &ImplSpec, samples: &[f64]) -> Self {
        Self {
            implementation: spec.name.clone(),
            variant: spec.variant.clone(),
            samples: samples.to_vec(),
            status: vec![RunStatus::Success; samples.len()],
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runs {
    pub baseline: RunRecord,
    pub optimized: RunRecord,
}

/// Statistics, verdict and gain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub baseline_stats: SampleStats,
    pub optimized_stats: SampleStats,
    pub delta_ms: f64,
    pub gain_pct: f64,
    pub verdict: Verdict,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub inputs: ImpactConfig,
    pub outputs: ImpactProjection,
}

/// Where the session's other artifacts live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub results_csv: String,
    pub summary_json: String,
    pub prometheus_url: String,
    pub grafana_url: String,
}

impl Default for Artifacts {
    fn default() -> Self {
        Self {
            results_csv: "runner/results.csv".to_string(),
            summary_json: "runner/summary.json".to_string(),
            prometheus_url: "http://localhost:9091".to_string(),
            grafana_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Report {
    /// Whether the telemetry agent supplied evidence
    pub fn evidence_available(&self) -> bool {
        self.evidence
            .get("available")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BenchError::MalformedInput(format!("report: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
        Self::from_json_str(&content)
    }

    /// Short console summary
    pub fn headline(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "  - Baseline: {:.1} ms ({}/{})\n",
            self.summary.baseline_stats.median,
            self.runs.baseline.implementation,
            self.runs.baseline.variant
        ));
        out.push_str(&format!(
            "  - Optimized: {:.1} ms ({}/{})\n",
            self.summary.optimized_stats.median,
            self.runs.optimized.implementation,
            self.runs.optimized.variant
        ));
        out.push_str(&format!("  - Gain: {:.1}%\n", self.summary.gain_pct));
        out.push_str(&format!("  - Verdict: {}\n", self.summary.verdict));
        out.push_str(&format!(
            "  - Evidence: {}\n",
            if self.evidence_available() {
                "available"
            } else {
                "not available"
            }
        ));
        if let Some(profiles) = &self.resource_profiles {
            out.push_str(&format!(
                "  - Resource profiles: {} implementations\n",
                profiles.len()
            ));
        }
        out
    }
}
