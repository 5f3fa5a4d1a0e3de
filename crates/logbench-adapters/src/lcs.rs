//! Longest-common-subsequence differ.
//!
//! Aligns the two logs with a full dynamic-programming table. Under
//! [`Metric::Equality`] only identical lines align; under
//! [`Metric::Similarity`] a line also aligns with a close rewrite, and both
//! sides of such a pair are marked `Updated`.

use std::sync::Arc;

use logbench_core::{
    ActionType, CancellationToken, DiffError, DiffOptions, DiffResult, Line, LogDiffer, Metric,
    TokenCache,
};

use crate::similarity::is_rewrite;

/// Largest DP table (in cells) the differ accepts.
pub const DEFAULT_MAX_CELLS: u64 = 50_000_000;

/// LCS differ over whole lines.
#[derive(Debug, Clone)]
pub struct LcsDiffer {
    cache: Arc<TokenCache>,
    max_cells: u64,
}

impl LcsDiffer {
    pub fn new(cache: Arc<TokenCache>) -> Self {
        Self {
            cache,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }

    pub fn with_max_cells(mut self, max_cells: u64) -> Self {
        self.max_cells = max_cells;
        self
    }

    fn aligns(&self, a: &Line, b: &Line, options: &DiffOptions) -> bool {
        match options.metric {
            Metric::Equality => a.value == b.value,
            Metric::Similarity => is_rewrite(&a.value, &b.value, options, &self.cache),
        }
    }
}

impl LogDiffer for LcsDiffer {
    fn diff(
        &self,
        left: &[Line],
        right: &[Line],
        options: &DiffOptions,
        cancel: &CancellationToken,
    ) -> Result<DiffResult, DiffError> {
        let pairs = lcs_pairs(left.len(), right.len(), self.max_cells, cancel, |i, j| {
            self.aligns(&left[i], &right[j], options)
        })?;
        Ok(actions_from_pairs(left, right, pairs))
    }
}

/// Matching `(left, right)` positions in ascending order.
///
/// `aligns(i, j)` decides whether `left[i]` may pair with `right[j]`.
pub(crate) fn lcs_pairs(
    m: usize,
    n: usize,
    max_cells: u64,
    cancel: &CancellationToken,
    aligns: impl Fn(usize, usize) -> bool,
) -> Result<Vec<(usize, usize)>, DiffError> {
    if m == 0 || n == 0 {
        return Ok(Vec::new());
    }

    let cells = (m as u64 + 1) * (n as u64 + 1);
    if cells > max_cells {
        return Err(DiffError::InputTooLarge {
            cells,
            limit: max_cells,
        });
    }

    // dp[i * width + j] = LCS length of left[..i] and right[..j]
    let width = n + 1;
    let mut dp = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        cancel.checkpoint()?;
        for j in 1..=n {
            dp[i * width + j] = if aligns(i - 1, j - 1) {
                dp[(i - 1) * width + j - 1] + 1
            } else {
                dp[i * width + j - 1].max(dp[(i - 1) * width + j])
            };
        }
    }

    let mut pairs = Vec::with_capacity(dp[m * width + n] as usize);
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if aligns(i - 1, j - 1) && dp[i * width + j] == dp[(i - 1) * width + j - 1] + 1 {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if dp[i * width + j - 1] > dp[(i - 1) * width + j] {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    pairs.reverse();
    Ok(pairs)
}

/// Aligned pairs are `Unchanged` when the values match and `Updated`
/// otherwise; everything else is `Deleted` on the left, `Added` on the right.
pub(crate) fn actions_from_pairs(
    left: &[Line],
    right: &[Line],
    pairs: Vec<(usize, usize)>,
) -> DiffResult {
    let mut left_actions = vec![ActionType::Deleted; left.len()];
    let mut right_actions = vec![ActionType::Added; right.len()];
    for (i, j) in pairs {
        let action = if left[i].value == right[j].value {
            ActionType::Unchanged
        } else {
            ActionType::Updated
        };
        left_actions[i] = action;
        right_actions[j] = action;
    }
    DiffResult::new(left_actions, right_actions)
}
