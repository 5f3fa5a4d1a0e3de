//! Parameter-sensitivity sweep over the two similarity thresholds.
//!
//! Every (rewrite_min, qgram_min) cell of an 11 x 11 grid over `[0.0, 1.0]`
//! re-runs the differ once, with no deadline, and records the right-side
//! lines it classifies as added. Output is raw per-cell rows; nothing is
//! aggregated and no cell is skipped.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::algorithm::{checked_diff, LogParser, Variant};
use crate::cache::TokenCache;
use crate::cancel::CancellationToken;
use crate::config::PairLayout;
use crate::selection::{load_lines, SelectionWriter};
use crate::types::Line;

/// Number of 0.1 steps between 0.0 and 1.0.
pub const SWEEP_STEPS: u32 = 10;

/// The grid points of one axis: `0.0, 0.1, ..., 1.0`.
///
/// Points are computed from integer steps so the upper bound is always hit
/// exactly.
pub fn sweep_axis() -> Vec<f64> {
    (0..=SWEEP_STEPS)
        .map(|i| f64::from(i) / f64::from(SWEEP_STEPS))
        .collect()
}

/// Row label of a cell, both parameters rounded to one decimal.
pub fn cell_label(rewrite_min: f64, qgram_min: f64) -> String {
    format!("l{:.1}-q{:.1}", rewrite_min, qgram_min)
}

/// Flagged right-side positions for one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCell {
    pub rewrite_min: f64,
    pub qgram_min: f64,
    pub flagged: Vec<usize>,
}

impl SweepCell {
    pub fn label(&self) -> String {
        cell_label(self.rewrite_min, self.qgram_min)
    }
}

/// Grid sweep of one variant.
pub struct ParameterSweep<'a> {
    variant: &'a Variant,
    axis: Vec<f64>,
}

impl<'a> ParameterSweep<'a> {
    pub fn new(variant: &'a Variant) -> Self {
        Self {
            variant,
            axis: sweep_axis(),
        }
    }

    /// Replace the default axis, mostly for tests.
    pub fn with_axis(mut self, axis: Vec<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// All grid cells, `rewrite_min` in the outer loop.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.axis
            .iter()
            .flat_map(move |&l| self.axis.iter().map(move |&q| (l, q)))
    }

    /// Run every cell on one pair, handing each result to `on_cell`.
    ///
    /// A cell whose diff fails is logged and reported with no flagged lines.
    pub fn sweep_pair(&self, left: &[Line], right: &[Line], mut on_cell: impl FnMut(SweepCell)) {
        let cancel = CancellationToken::new();
        for (rewrite_min, qgram_min) in self.cells() {
            let options = self
                .variant
                .options()
                .clone()
                .with_thresholds(rewrite_min, qgram_min);
            let differ = self.variant.instantiate();
            let flagged = match checked_diff(differ.as_ref(), left, right, &options, &cancel) {
                Ok(result) => result.added_positions(),
                Err(err) => {
                    warn!(
                        cell = %cell_label(rewrite_min, qgram_min),
                        error = %err,
                        "sweep cell failed"
                    );
                    Vec::new()
                }
            };
            debug!(cell = %cell_label(rewrite_min, qgram_min), flagged = flagged.len());
            on_cell(SweepCell {
                rewrite_min,
                qgram_min,
                flagged,
            });
        }
    }

    /// Sweep every listed directory, writing one row per flagged line.
    ///
    /// Returns the number of directories swept.
    pub fn run<P: LogParser, W: Write>(
        &self,
        parser: &P,
        layout: &PairLayout,
        dataset: &Path,
        paths: &[PathBuf],
        out: &mut SelectionWriter<W>,
        cache: Option<&TokenCache>,
    ) -> usize {
        let mut swept = 0;
        for (n, path) in paths.iter().enumerate() {
            let label = path.to_string_lossy();
            let (left, right) = match load_lines(parser, &dataset.join(path), layout) {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(path = %label, error = %err, "unreadable log pair, skipping");
                    continue;
                }
            };
            info!(index = n, total = paths.len(), path = %label, "sweeping");
            self.sweep_pair(&left, &right, |cell| {
                out.rows(&label, &cell.label(), &cell.flagged);
            });
            if let Some(cache) = cache {
                cache.clear();
            }
            swept += 1;
        }
        let _ = out.flush();
        swept
    }
}
