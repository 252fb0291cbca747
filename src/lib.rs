//! ChainBench - reproducible A/B performance comparisons
//!
//! This library provides the pieces of a benchmarking pipeline whose numbers
//! can be audited after the fact: content-addressed synthetic datasets with a
//! lock file, a statistics engine with a conclusive/inconclusive verdict, an
//! annual impact projection and a self-describing JSON report.

pub mod cli;
pub mod convert;
pub mod csv_output;
pub mod dataset;
pub mod error;
pub mod impact;
pub mod profiler;
pub mod report;
pub mod runner;
pub mod stats;

pub use error::{BenchError, Result};
