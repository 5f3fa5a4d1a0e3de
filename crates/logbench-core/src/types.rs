//! Shared data model: lines, per-line actions and diff results.

use serde::{Deserialize, Serialize};

/// One record from a log file.
///
/// `index` is unique and monotonic within the sequence produced for one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub value: String,
    pub index: usize,
}

impl Line {
    pub fn new(value: impl Into<String>, index: usize) -> Self {
        Self {
            value: value.into(),
            index,
        }
    }
}

/// Build a line sequence from plain values, indexed from zero.
pub fn lines_from<I, S>(values: I) -> Vec<Line>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| Line::new(value, index))
        .collect()
}

/// Per-line classification produced by a differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Added,
    Deleted,
    Updated,
    MovedUnchanged,
    MovedUpdated,
    Unchanged,
    None,
}

/// Output of one diff invocation.
///
/// `left` is aligned to the success log, `right` to the failure log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub left: Vec<ActionType>,
    pub right: Vec<ActionType>,
}

impl DiffResult {
    pub fn new(left: Vec<ActionType>, right: Vec<ActionType>) -> Self {
        Self { left, right }
    }

    /// The `([], [])` placeholder standing in for "did not complete".
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// True when both sides are empty, i.e. the result looks like the sentinel.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Positions on the right side classified as [`ActionType::Added`].
    ///
    /// Positions are yielded once each, in ascending order.
    pub fn added_positions(&self) -> Vec<usize> {
        self.right
            .iter()
            .enumerate()
            .filter(|(_, action)| **action == ActionType::Added)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Line comparison used by a differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Lines match only when their values are identical.
    Equality,
    /// Lines match when they are close enough under the similarity thresholds.
    #[default]
    Similarity,
}

/// Options handed to a differ for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffOptions {
    pub metric: Metric,
    /// Minimum token-level similarity for two lines to count as a rewrite.
    pub rewrite_min: f64,
    /// Minimum character q-gram similarity for two lines to count as a rewrite.
    pub qgram_min: f64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Similarity,
            rewrite_min: 0.5,
            qgram_min: 0.5,
        }
    }
}

impl DiffOptions {
    pub fn equality() -> Self {
        Self {
            metric: Metric::Equality,
            ..Self::default()
        }
    }

    pub fn with_thresholds(mut self, rewrite_min: f64, qgram_min: f64) -> Self {
        self.rewrite_min = rewrite_min;
        self.qgram_min = qgram_min;
        self
    }
}
