//! Line similarity measures used by the similarity metric.

use std::collections::{HashMap, HashSet};

use logbench_core::{DiffOptions, TokenCache};

const QGRAM: usize = 3;

/// Share of tokens two lines have in common, relative to the longer line.
///
/// Tokens are compared as multisets. Two token-less lines are identical.
pub fn token_similarity(a: &[String], b: &[String]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in a {
        *counts.entry(token.as_str()).or_default() += 1;
    }
    let mut common = 0;
    for token in b {
        if let Some(n) = counts.get_mut(token.as_str()) {
            if *n > 0 {
                *n -= 1;
                common += 1;
            }
        }
    }
    common as f64 / longest as f64
}

fn qgrams(s: &str) -> HashSet<&str> {
    let bounds: Vec<usize> = s
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .collect();
    let chars = bounds.len() - 1;
    if chars < QGRAM {
        return HashSet::from([s]);
    }
    (0..=chars - QGRAM)
        .map(|start| &s[bounds[start]..bounds[start + QGRAM]])
        .collect()
}

/// Jaccard similarity of the character trigram sets of two lines.
pub fn qgram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let (ga, gb) = (qgrams(a), qgrams(b));
    let union = ga.union(&gb).count();
    if union == 0 {
        return 1.0;
    }
    ga.intersection(&gb).count() as f64 / union as f64
}

/// True when `b` is close enough to `a` to count as a rewrite of it.
pub fn is_rewrite(a: &str, b: &str, options: &DiffOptions, cache: &TokenCache) -> bool {
    if a == b {
        return true;
    }
    let (ta, tb) = (cache.tokens(a), cache.tokens(b));
    token_similarity(&ta, &tb) >= options.rewrite_min && qgram_similarity(a, b) >= options.qgram_min
}
