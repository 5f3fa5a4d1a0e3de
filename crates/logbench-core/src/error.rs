//! Error taxonomy for the benchmark harness.

use std::path::PathBuf;

/// Errors produced by the harness itself (scanning, parsing, writing).
///
/// Algorithm failures are not represented here: they are absorbed by the
/// timeout runner and surface as a non-completed trial.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("dataset traversal failed: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors a differ may report for one comparison.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiffError {
    #[error("comparison cancelled")]
    Cancelled,

    #[error("input too large: {cells} cells exceeds limit of {limit}")]
    InputTooLarge { cells: u64, limit: u64 },

    #[error("{side} action count {actual} does not match {expected} lines")]
    LengthMismatch {
        side: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("differ failed: {0}")]
    Internal(String),
}
