//! Error taxonomy shared by the dataset, runner, report and converter paths
//!
//! Statistics never fail; everything else that touches files or external
//! input reports one of these variants.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by chainbench library operations
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Dataset already exists at {}; pass --force to overwrite", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Integrity mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Implementation '{0}' not found in entries")]
    LookupFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chainbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Map an I/O error on `path` to `NotFound` when the file is missing
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            BenchError::NotFound(path.to_path_buf())
        } else {
            BenchError::Io(err)
        }
    }
}
