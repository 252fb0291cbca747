//! Dataset Authority: reproducible synthetic datasets pinned by SHA-256
//!
//! A dataset is two row-major `f64` matrices (embeddings `N x D`, axes `M x D`)
//! drawn from a seeded standard normal generator. The content hash covers the
//! raw little-endian bytes of the embeddings followed by the axes, with no
//! separator. The same digest is written to `metadata.json` and to the
//! standalone `dataset.lock` pin that the runner checks before timing anything.

use crate::error::{BenchError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const METADATA_FILE: &str = "metadata.json";
pub const LOCK_FILE: &str = "dataset.lock";
pub const EMBEDDINGS_FILE: &str = "embeddings.f64";
pub const AXES_FILE: &str = "axes.f64";

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// Shape and seed of a dataset to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetParams {
    /// Number of embeddings (rows of the embeddings matrix)
    pub n: i64,
    /// Number of axes (rows of the axes matrix)
    pub m: i64,
    /// Dimensionality shared by both matrices
    pub d: i64,
    pub seed: u64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            n: 2000,
            m: 15,
            d: 96,
            seed: 42,
        }
    }
}

impl DatasetParams {
    /// N, M and D must all be strictly positive and the arrays must fit in memory
    pub fn validate(&self) -> Result<()> {
        if self.n <= 0 || self.m <= 0 || self.d <= 0 {
            return Err(BenchError::InvalidParameters(format!(
                "N, M, and D must be positive integers (got N={}, M={}, D={})",
                self.n, self.m, self.d
            )));
        }
        self.size_bytes().map(|_| ())
    }

    /// Byte sizes of both arrays, rejecting shapes that overflow the address space
    pub fn size_bytes(&self) -> Result<SizeBytes> {
        let overflow = || {
            BenchError::InvalidParameters(format!(
                "dataset of N={}, M={}, D={} is too large to allocate",
                self.n, self.m, self.d
            ))
        };
        let array_bytes = |rows: i64| {
            u64::try_from(rows)
                .ok()
                .zip(u64::try_from(self.d).ok())
                .and_then(|(rows, d)| rows.checked_mul(d))
                .and_then(|elems| elems.checked_mul(F64_BYTES as u64))
                .ok_or_else(overflow)
        };
        let embeddings = array_bytes(self.n)?;
        let axes = array_bytes(self.m)?;
        let total = embeddings.checked_add(axes).ok_or_else(overflow)?;
        usize::try_from(total).map_err(|_| overflow())?;
        Ok(SizeBytes {
            embeddings,
            axes,
            total,
        })
    }
}

/// Byte sizes of the persisted arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBytes {
    pub embeddings: u64,
    pub axes: u64,
    pub total: u64,
}

/// Persisted dataset descriptor (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub hash_sha256: String,
    #[serde(rename = "N")]
    pub n: u64,
    #[serde(rename = "M")]
    pub m: u64,
    #[serde(rename = "D")]
    pub d: u64,
    pub seed: u64,
    pub embeddings_file: String,
    pub axes_file: String,
    pub embeddings_shape: [u64; 2],
    pub axes_shape: [u64; 2],
    pub dtype: String,
    pub size_bytes: SizeBytes,
}

/// Outcome of an integrity verification
///
/// Verification fails closed: a missing file or a bad hash is an expected
/// negative result, reported through `reason` rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub valid: bool,
    /// Recalculated digest, when both arrays could be read
    pub hash: Option<String>,
    pub reason: Option<String>,
}

impl VerifyOutcome {
    fn ok(hash: String) -> Self {
        Self {
            valid: true,
            hash: Some(hash),
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Dataset verification failed: {}", reason);
        Self {
            valid: false,
            hash: None,
            reason: Some(reason),
        }
    }
}

/// Serialize `f64` values as raw little-endian bytes, preserving order
pub fn f64s_to_bytes(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * F64_BYTES);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// SHA-256 over `embeddings || axes` as lowercase hex
pub fn dataset_hash(embeddings: &[u8], axes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(embeddings);
    hasher.update(axes);
    hex::encode(hasher.finalize())
}

/// One standard normal draw using the Box-Muller transform
pub fn normal_draw<R: Rng>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); flip it so ln never sees zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn standard_normal(rng: &mut StdRng, count: usize) -> Vec<f64> {
    (0..count).map(|_| normal_draw(rng)).collect()
}

/// Generate a dataset into `dir`, writing both arrays, metadata and lock
///
/// # Errors
/// - `InvalidParameters` if N, M or D is not strictly positive
/// - `AlreadyExists` if `dir/metadata.json` exists and `overwrite` is false
pub fn generate_dataset(
    params: &DatasetParams,
    dir: &Path,
    overwrite: bool,
) -> Result<DatasetMetadata> {
    params.validate()?;
    let size_bytes = params.size_bytes()?;

    let metadata_path = dir.join(METADATA_FILE);
    if metadata_path.exists() && !overwrite {
        return Err(BenchError::AlreadyExists(dir.to_path_buf()));
    }

    fs::create_dir_all(dir)?;

    let (n, m, d) = (params.n as u64, params.m as u64, params.d as u64);
    info!(
        "Generating dataset: N={}, M={}, D={}, seed={}",
        n, m, d, params.seed
    );

    let mut rng = StdRng::seed_from_u64(params.seed);

    let elems = |bytes: u64| (bytes / F64_BYTES as u64) as usize;

    let embeddings = standard_normal(&mut rng, elems(size_bytes.embeddings));
    let embeddings_bytes = f64s_to_bytes(&embeddings);
    fs::write(dir.join(EMBEDDINGS_FILE), &embeddings_bytes)?;
    debug!("Wrote {} embeddings of dimension {}", n, d);

    let axes = standard_normal(&mut rng, elems(size_bytes.axes));
    let axes_bytes = f64s_to_bytes(&axes);
    fs::write(dir.join(AXES_FILE), &axes_bytes)?;
    debug!("Wrote {} axes of dimension {}", m, d);

    let hash = dataset_hash(&embeddings_bytes, &axes_bytes);

    let metadata = DatasetMetadata {
        hash_sha256: hash.clone(),
        n,
        m,
        d,
        seed: params.seed,
        embeddings_file: EMBEDDINGS_FILE.to_string(),
        axes_file: AXES_FILE.to_string(),
        embeddings_shape: [n, d],
        axes_shape: [m, d],
        dtype: "float64".to_string(),
        size_bytes,
    };

    fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;
    fs::write(dir.join(LOCK_FILE), &hash)?;

    info!("Dataset hash: {}", hash);
    Ok(metadata)
}

/// Load a dataset descriptor
pub fn load_metadata(path: &Path) -> Result<DatasetMetadata> {
    let content = fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
    serde_json::from_str(&content)
        .map_err(|e| BenchError::MalformedInput(format!("{}: {}", path.display(), e)))
}

fn read_array(path: &Path, shape: [u64; 2]) -> std::result::Result<Vec<u8>, String> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => format!("{} not found", path.display()),
        _ => format!("failed to read {}: {}", path.display(), e),
    })?;

    let expected = shape[0]
        .checked_mul(shape[1])
        .and_then(|cells| cells.checked_mul(F64_BYTES as u64))
        .ok_or_else(|| format!("shape {:?} overflows", shape))?;

    if bytes.len() as u64 != expected {
        return Err(format!(
            "{} has {} bytes, shape {:?} requires {}",
            path.display(),
            bytes.len(),
            shape,
            expected
        ));
    }
    Ok(bytes)
}

/// Re-hash the arrays in `dir` and compare against the recorded digest
pub fn verify_dataset(dir: &Path) -> VerifyOutcome {
    let metadata_path = dir.join(METADATA_FILE);
    if !metadata_path.exists() {
        return VerifyOutcome::fail(format!("{} not found", metadata_path.display()));
    }

    let metadata = match load_metadata(&metadata_path) {
        Ok(m) => m,
        Err(e) => return VerifyOutcome::fail(e.to_string()),
    };

    let embeddings = match read_array(
        &dir.join(&metadata.embeddings_file),
        metadata.embeddings_shape,
    ) {
        Ok(b) => b,
        Err(reason) => return VerifyOutcome::fail(reason),
    };
    let axes = match read_array(&dir.join(&metadata.axes_file), metadata.axes_shape) {
        Ok(b) => b,
        Err(reason) => return VerifyOutcome::fail(reason),
    };

    let calculated = dataset_hash(&embeddings, &axes);
    if calculated != metadata.hash_sha256 {
        return VerifyOutcome::fail(format!(
            "hash mismatch: expected {}, got {}",
            metadata.hash_sha256, calculated
        ));
    }

    debug!("Dataset verified: {}", calculated);
    VerifyOutcome::ok(calculated)
}

/// Pure comparison of a lock pin against the descriptor's recorded hash
pub fn check_lock(metadata: &DatasetMetadata, lock_hash: &str) -> bool {
    metadata.hash_sha256 == lock_hash
}

/// Path of the lock file inside a dataset directory
pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE)
}

/// Read the bare digest from `dir/dataset.lock`
pub fn read_lock(dir: &Path) -> Result<String> {
    let path = lock_path(dir);
    let content = fs::read_to_string(&path).map_err(|e| BenchError::from_io(e, &path))?;
    Ok(content.trim().to_string())
}

/// Pre-flight check run before any timing begins
///
/// # Errors
/// - `NotFound` if the lock file is missing
/// - `IntegrityMismatch` if the lock does not pin the descriptor's hash
pub fn verify_dataset_lock(metadata: &DatasetMetadata, dir: &Path) -> Result<()> {
    let lock_hash = read_lock(dir)?;
    if !check_lock(metadata, &lock_hash) {
        return Err(BenchError::IntegrityMismatch {
            expected: metadata.hash_sha256.clone(),
            actual: lock_hash,
        });
    }
    Ok(())
}
