//! Benchmark rows and the primary CSV writer.

use std::io::Write;
use std::time::Duration;

use csv::QuoteStyle;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::metrics::Metrics;
use crate::types::DiffResult;

/// Header line of the benchmark CSV.
pub const BENCHMARK_CSV_HEADER: &str = "directory,type,duration,lines-left,lines-right,actions,added,deleted,updated,moved-unchanged,moved-updated,similar-groups,similar-groups-left,similar-groups-right,runs";

/// Duration written when no trial completed.
pub const SENTINEL_DURATION_MS: f64 = -1.0;

/// One row per (directory, variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Dataset-relative directory.
    pub directory: String,
    pub variant: String,
    /// Representative duration, `None` when no trial completed.
    pub duration: Option<Duration>,
    pub lines_left: usize,
    pub lines_right: usize,
    pub metrics: Metrics,
    /// Number of completed trials.
    pub runs: usize,
}

impl BenchmarkRecord {
    /// Build a row from the completed trials of one measurement.
    ///
    /// `completed` carries every completed trial's duration together with
    /// the last completed result. `None`, or an empty duration list, gives
    /// the sentinel duration and zeroed metrics.
    pub fn from_trials(
        directory: impl Into<String>,
        variant: impl Into<String>,
        lines_left: usize,
        lines_right: usize,
        completed: Option<(Vec<Duration>, &DiffResult)>,
    ) -> Self {
        let (duration, metrics, runs) = match completed {
            Some((mut durations, last)) => match representative_duration(&mut durations) {
                Some(d) => (Some(d), Metrics::from_diff(last), durations.len()),
                None => (None, Metrics::default(), 0),
            },
            None => (None, Metrics::default(), 0),
        };
        Self {
            directory: directory.into(),
            variant: variant.into(),
            duration,
            lines_left,
            lines_right,
            metrics,
            runs,
        }
    }

    /// Duration in milliseconds, or [`SENTINEL_DURATION_MS`].
    pub fn duration_ms(&self) -> f64 {
        self.duration
            .map(|d| d.as_secs_f64() * 1_000.0)
            .unwrap_or(SENTINEL_DURATION_MS)
    }

    pub fn completed(&self) -> bool {
        self.duration.is_some()
    }

    /// Field values in header order.
    pub fn csv_fields(&self) -> [String; 15] {
        let m = &self.metrics;
        [
            self.directory.clone(),
            self.variant.clone(),
            format!("{:.1}", self.duration_ms()),
            self.lines_left.to_string(),
            self.lines_right.to_string(),
            m.actions.to_string(),
            m.added.to_string(),
            m.deleted.to_string(),
            m.updated.to_string(),
            m.moved_unchanged.to_string(),
            m.moved_updated.to_string(),
            m.similar_blocks().to_string(),
            m.similar_blocks_left.to_string(),
            m.similar_blocks_right.to_string(),
            self.runs.to_string(),
        ]
    }
}

/// Median-style pick: sort ascending, take the element at `len / 2`.
pub fn representative_duration(durations: &mut [Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    durations.sort_unstable();
    Some(durations[durations.len() / 2])
}

/// Append-only writer for the benchmark CSV.
///
/// Text fields are always quoted, numbers never. Every row is flushed as
/// soon as it is written; write errors propagate.
pub struct BenchmarkWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> BenchmarkWriter<W> {
    /// Wrap `inner` and write the header line.
    pub fn new(mut inner: W) -> Result<Self> {
        writeln!(inner, "{}", BENCHMARK_CSV_HEADER)?;
        inner.flush()?;
        let inner = csv::WriterBuilder::new()
            .quote_style(QuoteStyle::NonNumeric)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Ok(Self { inner, rows: 0 })
    }

    pub fn append(&mut self, record: &BenchmarkRecord) -> Result<()> {
        self.inner.write_record(record.csv_fields())?;
        self.inner.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| BenchError::Io(err.into_error()))
    }
}
