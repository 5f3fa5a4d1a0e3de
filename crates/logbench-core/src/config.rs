//! Compiled-in benchmark parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// File names and traversal bound used to discover log pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairLayout {
    /// Name of the log from the passing run (left side).
    pub success_file: String,
    /// Name of the log from the failing run (right side).
    pub failure_file: String,
    /// Directories at this depth or deeper are not inspected (root is depth 0).
    pub max_depth: usize,
}

impl Default for PairLayout {
    fn default() -> Self {
        Self {
            success_file: "success.log".to_string(),
            failure_file: "failure.log".to_string(),
            max_depth: 10,
        }
    }
}

/// Configuration for a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Wall-clock deadline for one trial (seconds).
    pub timeout_secs: u64,
    /// Maximum trials per (directory, variant).
    pub trials: u32,
    /// A completed trial at least this long ends the series (milliseconds).
    pub long_trial_ms: u64,
    pub layout: PairLayout,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            trials: 3,
            long_trial_ms: 60_000,
            layout: PairLayout::default(),
        }
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn long_trial(&self) -> Duration {
        Duration::from_millis(self.long_trial_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(BenchError::InvalidConfig("trials must be > 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(BenchError::InvalidConfig("timeout_secs must be > 0".into()));
        }
        if self.layout.success_file.is_empty() || self.layout.failure_file.is_empty() {
            return Err(BenchError::InvalidConfig(
                "log pair file names must not be empty".into(),
            ));
        }
        if self.layout.success_file == self.layout.failure_file {
            return Err(BenchError::InvalidConfig(
                "success and failure logs must have distinct names".into(),
            ));
        }
        Ok(())
    }
}
