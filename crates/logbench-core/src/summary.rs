//! Run summary artifact written next to the benchmark CSV.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::runner::TrialOutcome;

/// Per-outcome trial counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialCounters {
    pub completed: u64,
    pub timed_out: u64,
    pub failed: u64,
}

impl TrialCounters {
    pub fn record(&mut self, outcome: &TrialOutcome) {
        match outcome {
            TrialOutcome::Completed(_) => self.completed += 1,
            TrialOutcome::TimedOut => self.timed_out += 1,
            TrialOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.completed + self.timed_out + self.failed
    }
}

/// What one benchmark run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Directories handed to the controller.
    pub directories: usize,
    /// Directories skipped because a log was empty or unreadable.
    pub skipped: usize,
    /// Rows written to the benchmark CSV.
    pub rows: usize,
    /// Rows whose duration is the sentinel.
    pub incomplete_rows: usize,
    pub trials: TrialCounters,
    pub variants: Vec<String>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, directories: usize, variants: Vec<String>) -> Self {
        Self {
            started_at,
            ended_at: started_at,
            directories,
            skipped: 0,
            rows: 0,
            incomplete_rows: 0,
            trials: TrialCounters::default(),
            variants,
        }
    }
}

/// Write the summary as pretty JSON.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let content = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, content)?;
    Ok(())
}
