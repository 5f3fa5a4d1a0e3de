//! Multi-trial, multi-variant benchmark loop.
//!
//! Directories are processed strictly in the order given. Within a directory
//! the variant order alternates with the directory's parity (even index:
//! configured order, odd index: reversed) so that ordering effects on timing
//! cancel out across the corpus. Exactly one trial runs at a time.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use tracing::{warn, Instrument};

use crate::algorithm::{checked_diff, LogParser, Variant};
use crate::cache::TokenCache;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::obs::{
    emit_directory_skipped, emit_row_written, emit_run_finished, emit_run_started,
    emit_trial_finished, measurement_span,
};
use crate::progress::ProgressLog;
use crate::record::{BenchmarkRecord, BenchmarkWriter};
use crate::runner::{TimeoutRunner, TrialOutcome};
use crate::scan::relative_label;
use crate::summary::{RunSummary, TrialCounters};
use crate::types::{DiffResult, Line};

/// Order in which `count` variants run for the directory at `index`.
pub fn variant_order(index: usize, count: usize) -> Vec<usize> {
    if index % 2 == 0 {
        (0..count).collect()
    } else {
        (0..count).rev().collect()
    }
}

/// Drives parsing, timed trials and row emission for a list of directories.
pub struct BenchmarkController<P: LogParser> {
    config: BenchConfig,
    parser: P,
    variants: Vec<Variant>,
    cache: Arc<TokenCache>,
    runner: TimeoutRunner,
}

impl<P: LogParser> BenchmarkController<P> {
    /// `cache` is the token cache shared with `parser` and the variants'
    /// differs; it is cleared after every measurement.
    pub fn new(
        config: BenchConfig,
        parser: P,
        variants: Vec<Variant>,
        cache: Arc<TokenCache>,
    ) -> Result<Self> {
        config.validate()?;
        if variants.is_empty() {
            return Err(BenchError::InvalidConfig(
                "at least one variant is required".into(),
            ));
        }
        let runner = TimeoutRunner::new(config.timeout());
        Ok(Self {
            config,
            parser,
            variants,
            cache,
            runner,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Benchmark every directory, appending one row per (directory, variant).
    ///
    /// Directories where either log parses to nothing are skipped. Errors
    /// writing a row abort the run.
    pub async fn run<W: Write>(
        &self,
        dataset: &Path,
        directories: &[PathBuf],
        writer: &mut BenchmarkWriter<W>,
        progress: &mut ProgressLog,
    ) -> Result<RunSummary> {
        let clock = Instant::now();
        let started_local = Local::now();
        let mut summary = RunSummary::new(
            Utc::now(),
            directories.len(),
            self.variants.iter().map(|v| v.name().to_string()).collect(),
        );
        progress.started_at(started_local);
        emit_run_started(directories.len(), self.variants.len());

        let total = directories.len();
        for (index, dir) in directories.iter().enumerate() {
            let label = relative_label(dataset, dir);
            match self.load_pair(dir) {
                Ok(Some((left, right))) => {
                    for v in variant_order(index, self.variants.len()) {
                        let variant = &self.variants[v];
                        progress.measuring(index, total, variant.name(), &label);

                        let record = self
                            .measure(&label, variant, &left, &right, &mut summary.trials)
                            .instrument(measurement_span(&label, variant.name()))
                            .await;

                        progress.measured(index, total, variant.name(), &label, record.duration);
                        writer.append(&record)?;
                        emit_row_written(&record);
                        summary.rows += 1;
                        if !record.completed() {
                            summary.incomplete_rows += 1;
                        }
                        self.cache.clear();
                    }
                }
                Ok(None) => {
                    summary.skipped += 1;
                    emit_directory_skipped(&label, &"empty log");
                }
                Err(err) => {
                    summary.skipped += 1;
                    warn!(directory = %label, error = %err, "unreadable log pair, skipping");
                }
            }
            // Parsed lines are dropped at this point; give the cache's
            // allocation back as well before the next directory.
            self.cache.release();
        }

        summary.ended_at = Utc::now();
        progress.ended_at(started_local, Local::now());
        emit_run_finished(summary.rows, summary.skipped, clock.elapsed());
        Ok(summary)
    }

    /// Run up to `trials` timed trials of one variant on one pair.
    pub async fn measure(
        &self,
        label: &str,
        variant: &Variant,
        left: &Arc<[Line]>,
        right: &Arc<[Line]>,
        counters: &mut TrialCounters,
    ) -> BenchmarkRecord {
        let long_trial = self.config.long_trial();
        let mut completed: Vec<Duration> = Vec::with_capacity(self.config.trials as usize);
        let mut last: Option<DiffResult> = None;

        for trial in 1..=self.config.trials {
            let differ = variant.instantiate();
            let options = variant.options().clone();
            let (l, r) = (Arc::clone(left), Arc::clone(right));

            let start = Instant::now();
            let outcome = self
                .runner
                .run(move |cancel| checked_diff(differ.as_ref(), &l, &r, &options, cancel))
                .await;
            let elapsed = start.elapsed();

            emit_trial_finished(trial, &outcome, elapsed);
            counters.record(&outcome);
            match outcome {
                TrialOutcome::Completed(result) => {
                    completed.push(elapsed);
                    last = Some(result);
                    if elapsed >= long_trial {
                        break;
                    }
                }
                TrialOutcome::TimedOut | TrialOutcome::Failed(_) => break,
            }
        }

        BenchmarkRecord::from_trials(
            label,
            variant.name(),
            left.len(),
            right.len(),
            last.as_ref().map(|result| (completed, result)),
        )
    }

    /// Parse both logs of `dir`; `None` when either is empty.
    fn load_pair(&self, dir: &Path) -> Result<Option<(Arc<[Line]>, Arc<[Line]>)>> {
        let layout = &self.config.layout;
        let left = self.parser.parse(&dir.join(&layout.success_file))?;
        if left.is_empty() {
            return Ok(None);
        }
        let right = self.parser.parse(&dir.join(&layout.failure_file))?;
        if right.is_empty() {
            return Ok(None);
        }
        Ok(Some((left.into(), right.into())))
    }
}
