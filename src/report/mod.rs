//! Report aggregation: one versioned, self-describing record per session
//!
//! Merges the runner summary, the dataset descriptor, the statistics engine's
//! comparison, the impact projection and optional external evidence into the
//! canonical `report.json` (schema 1.0.0).

mod builder;
mod machine;
mod schema;

pub use builder::{
    build_report, build_report_with, load_evidence, report_id, ReportContext, ReportInputs,
};
pub use machine::{git_commit, MachineInfo, UNKNOWN};
pub use schema::{
    Artifacts, BenchmarkInfo, DatasetSnapshot, Impact, Report, ReportMeta, RunError, RunRecord,
    RunStatus, Runs, SingleThread, StabilityInfo, Summary, SCHEMA_VERSION,
};
