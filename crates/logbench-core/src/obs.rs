//! Structured observability hooks for benchmark lifecycle events.
//!
//! This module provides:
//! - A measurement-scoped tracing span via [`measurement_span`]
//! - Emission functions for trial outcomes, written rows and skipped directories
//!
//! Events are emitted at `info!`/`debug!` level and filtered through `RUST_LOG`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::record::BenchmarkRecord;
use crate::runner::TrialOutcome;

/// Span covering one (directory, variant) measurement.
///
/// Attach it with `Instrument::instrument` so it is only entered while the
/// measurement future is polled.
///
/// ```ignore
/// controller.measure(..).instrument(measurement_span("org/repo/12", "lcs")).await;
/// ```
pub fn measurement_span(directory: &str, variant: &str) -> tracing::Span {
    tracing::info_span!("logbench.measure", directory = %directory, variant = %variant)
}

/// Emit event: benchmark run started.
pub fn emit_run_started(directories: usize, variants: usize) {
    info!(event = "run.started", directories, variants);
}

/// Emit event: benchmark run finished.
pub fn emit_run_finished(rows: usize, skipped: usize, elapsed: Duration) {
    info!(
        event = "run.finished",
        rows,
        skipped,
        elapsed_ms = elapsed.as_millis() as u64,
    );
}

/// Emit event: one trial ended.
pub fn emit_trial_finished(trial: u32, outcome: &TrialOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
    match outcome {
        TrialOutcome::Completed(_) => {
            debug!(event = "trial.finished", trial, outcome = outcome.label(), elapsed_ms)
        }
        TrialOutcome::TimedOut => {
            warn!(event = "trial.finished", trial, outcome = outcome.label(), elapsed_ms)
        }
        TrialOutcome::Failed(reason) => warn!(
            event = "trial.finished",
            trial,
            outcome = outcome.label(),
            reason = %reason,
            elapsed_ms,
        ),
    }
}

/// Emit event: a benchmark row was written.
pub fn emit_row_written(record: &BenchmarkRecord) {
    info!(
        event = "row.written",
        directory = %record.directory,
        variant = %record.variant,
        duration_ms = record.duration_ms(),
        runs = record.runs,
        actions = record.metrics.actions,
    );
}

/// Emit event: a directory was skipped before measuring.
pub fn emit_directory_skipped(directory: &str, reason: &dyn std::fmt::Display) {
    debug!(event = "directory.skipped", directory = %directory, reason = %reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_span_enter() {
        let span = measurement_span("org/repo/1", "lcs");
        let _guard = span.enter();
        emit_directory_skipped("org/repo/1", &"empty failure log");
    }
}
