//! Collaborator contracts: the log parser and the differ under benchmark.
//!
//! The harness never parses or aligns logs itself. It drives implementations
//! of these traits and measures them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::error::{DiffError, Result};
use crate::types::{DiffOptions, DiffResult, Line};

/// Turns a log file into an ordered sequence of lines.
///
/// Must be deterministic per file. An empty file yields an empty sequence.
pub trait LogParser {
    fn parse(&self, path: &Path) -> Result<Vec<Line>>;
}

/// Classifies every line of two sequences.
///
/// Implementations should poll `cancel` at safe points so a timed-out trial
/// releases its worker early.
pub trait LogDiffer: Send + Sync {
    fn diff(
        &self,
        left: &[Line],
        right: &[Line],
        options: &DiffOptions,
        cancel: &CancellationToken,
    ) -> std::result::Result<DiffResult, DiffError>;
}

/// Builds a fresh differ for one comparison.
pub type DifferFactory = Arc<dyn Fn() -> Arc<dyn LogDiffer> + Send + Sync>;

/// Builds a fresh parser, for parsers that learn from what they read.
pub type ParserFactory = Arc<dyn Fn() -> Box<dyn LogParser> + Send + Sync>;

#[derive(Clone)]
enum DifferSource {
    /// Stateless differ, safe to reuse across comparisons.
    Shared(Arc<dyn LogDiffer>),
    /// Differ that accumulates state; constructed anew per comparison.
    Fresh(DifferFactory),
}

/// A named algorithm plus configuration under benchmark comparison.
#[derive(Clone)]
pub struct Variant {
    name: String,
    source: DifferSource,
    options: DiffOptions,
}

impl Variant {
    /// Variant backed by a stateless differ reused for every comparison.
    pub fn shared(name: impl Into<String>, differ: Arc<dyn LogDiffer>, options: DiffOptions) -> Self {
        Self {
            name: name.into(),
            source: DifferSource::Shared(differ),
            options,
        }
    }

    /// Variant whose differ is rebuilt by `factory` for every comparison.
    pub fn fresh(name: impl Into<String>, factory: DifferFactory, options: DiffOptions) -> Self {
        Self {
            name: name.into(),
            source: DifferSource::Fresh(factory),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// The differ to use for the next comparison.
    pub fn instantiate(&self) -> Arc<dyn LogDiffer> {
        match &self.source {
            DifferSource::Shared(differ) => Arc::clone(differ),
            DifferSource::Fresh(factory) => factory(),
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            DifferSource::Shared(_) => "shared",
            DifferSource::Fresh(_) => "fresh",
        };
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("source", &source)
            .field("options", &self.options)
            .finish()
    }
}

/// Run `differ` and verify the result lines up with its inputs.
pub fn checked_diff(
    differ: &dyn LogDiffer,
    left: &[Line],
    right: &[Line],
    options: &DiffOptions,
    cancel: &CancellationToken,
) -> std::result::Result<DiffResult, DiffError> {
    let result = differ.diff(left, right, options, cancel)?;
    if result.left.len() != left.len() {
        return Err(DiffError::LengthMismatch {
            side: "left",
            expected: left.len(),
            actual: result.left.len(),
        });
    }
    if result.right.len() != right.len() {
        return Err(DiffError::LengthMismatch {
            side: "right",
            expected: right.len(),
            actual: result.right.len(),
        });
    }
    Ok(result)
}
