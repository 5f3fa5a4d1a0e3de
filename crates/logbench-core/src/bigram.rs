//! Bigram novelty baseline.
//!
//! Flags failure-log lines whose value takes part in a consecutive-line
//! pairing that never occurs in the success log.

use std::collections::HashSet;

use crate::types::Line;

/// Ordered pairs of consecutive line values in `lines`.
pub fn bigrams(lines: &[Line]) -> HashSet<(&str, &str)> {
    lines
        .windows(2)
        .map(|pair| (pair[0].value.as_str(), pair[1].value.as_str()))
        .collect()
}

/// Values appearing in at least one right-only bigram.
pub fn novel_vocabulary<'a>(left: &'a [Line], right: &'a [Line]) -> HashSet<&'a str> {
    let known = bigrams(left);
    bigrams(right)
        .into_iter()
        .filter(|bigram| !known.contains(bigram))
        .flat_map(|(first, second)| [first, second])
        .collect()
}

/// Indices of right lines whose value belongs to the novel vocabulary, in
/// right-sequence order.
///
/// Every occurrence of a novel value is flagged, including occurrences that
/// were not part of a novel bigram themselves.
pub fn novel_line_indices(left: &[Line], right: &[Line]) -> Vec<usize> {
    let vocabulary = novel_vocabulary(left, right);
    right
        .iter()
        .filter(|line| vocabulary.contains(line.value.as_str()))
        .map(|line| line.index)
        .collect()
}
