//! Bag-of-lines differ.
//!
//! Ignores order entirely: a right-side line is `Added` when its exact value
//! never occurs on the left, and a left-side line is `Deleted` when it never
//! occurs on the right. Runs in linear time, so it serves as a fast lower
//! bound next to the LCS differ.

use std::collections::HashSet;

use logbench_core::{
    ActionType, CancellationToken, DiffError, DiffOptions, DiffResult, Line, LogDiffer,
};

/// Lines classified between cancellation polls.
const POLL_EVERY: usize = 4096;

#[derive(Debug, Clone, Copy, Default)]
pub struct BagDiffer;

fn classify(
    lines: &[Line],
    other: &HashSet<&str>,
    missing: ActionType,
    cancel: &CancellationToken,
) -> Result<Vec<ActionType>, DiffError> {
    let mut actions = Vec::with_capacity(lines.len());
    for (n, line) in lines.iter().enumerate() {
        if n % POLL_EVERY == 0 {
            cancel.checkpoint()?;
        }
        actions.push(if other.contains(line.value.as_str()) {
            ActionType::Unchanged
        } else {
            missing
        });
    }
    Ok(actions)
}

impl LogDiffer for BagDiffer {
    fn diff(
        &self,
        left: &[Line],
        right: &[Line],
        _options: &DiffOptions,
        cancel: &CancellationToken,
    ) -> Result<DiffResult, DiffError> {
        let left_set: HashSet<&str> = left.iter().map(|l| l.value.as_str()).collect();
        let right_set: HashSet<&str> = right.iter().map(|l| l.value.as_str()).collect();
        Ok(DiffResult::new(
            classify(left, &right_set, ActionType::Deleted, cancel)?,
            classify(right, &left_set, ActionType::Added, cancel)?,
        ))
    }
}
