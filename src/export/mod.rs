//! Exported artifacts: feature table, segment analysis, text summary, content fingerprint.

mod summary;
mod tables;

pub use summary::write_feature_summary;
pub use tables::{
    feature_columns, validate_features_csv, write_features_csv, write_segment_analysis_csv,
    FEATURES_FILE, SEGMENTS_FILE,
};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("exported file {path} failed validation: {reason}")]
    Validation { path: PathBuf, reason: String },
}

/// Create `dir` (and parents) if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// SHA-256 hex digest of a file's bytes
pub fn fingerprint(path: &Path) -> Result<String, ExportError> {
    let data = std::fs::read(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut h = Sha256::new();
    h.update(&data);
    Ok(format!("{:x}", h.finalize()))
}
