//! Structural quality metrics derived from a diff result.

use serde::{Deserialize, Serialize};

use crate::types::{ActionType, DiffResult};

/// Action counts and similarity-block counts of one diff result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Left actions other than `Unchanged`, plus `added`.
    pub actions: usize,
    /// `Added` on the right side.
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
    pub moved_unchanged: usize,
    pub moved_updated: usize,
    pub similar_blocks_left: usize,
    pub similar_blocks_right: usize,
}

impl Metrics {
    /// Derive metrics from `result`.
    ///
    /// `deleted`, `updated` and both move counts are tallied on the left side
    /// only; `added` on the right side only.
    pub fn from_diff(result: &DiffResult) -> Self {
        let added = result
            .right
            .iter()
            .filter(|a| **a == ActionType::Added)
            .count();

        let mut metrics = Metrics {
            added,
            similar_blocks_left: count_blocks(&result.left),
            similar_blocks_right: count_blocks(&result.right),
            ..Metrics::default()
        };

        let mut changed_left = 0;
        for action in &result.left {
            if *action != ActionType::Unchanged {
                changed_left += 1;
            }
            match action {
                ActionType::Deleted => metrics.deleted += 1,
                ActionType::Updated => metrics.updated += 1,
                ActionType::MovedUnchanged => metrics.moved_unchanged += 1,
                ActionType::MovedUpdated => metrics.moved_updated += 1,
                ActionType::Added | ActionType::Unchanged | ActionType::None => {}
            }
        }
        metrics.actions = changed_left + added;
        metrics
    }

    /// Similarity blocks over both sides.
    pub fn similar_blocks(&self) -> usize {
        self.similar_blocks_left + self.similar_blocks_right
    }
}

/// Number of maximal runs of identical action type in `actions`.
pub fn count_blocks(actions: &[ActionType]) -> usize {
    match actions.split_first() {
        None => 0,
        Some((first, rest)) => {
            let mut blocks = 1;
            let mut last = first;
            for action in rest {
                if action != last {
                    blocks += 1;
                    last = action;
                }
            }
            blocks
        }
    }
}
