//! Keyword baseline: a line is interesting when it mentions a failure word.

use crate::types::Line;

/// Words that mark a line as failure-related (matched case-insensitively).
pub const FAILURE_KEYWORDS: [&str; 6] = ["failure", "fail", "failed", "error", "exception", "panic"];

/// Indices of lines containing any of [`FAILURE_KEYWORDS`].
pub fn keyword_lines(lines: &[Line]) -> Vec<usize> {
    lines
        .iter()
        .filter(|line| {
            let lower = line.value.to_lowercase();
            FAILURE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lines_from;

    #[test]
    fn flags_case_insensitive_matches_once() {
        let lines = lines_from([
            "Compiling crate v0.1.0",
            "ERROR: test failed with exception",
            "thread 'main' panicked at src/lib.rs",
            "Finished",
        ]);
        assert_eq!(keyword_lines(&lines), vec![1, 2]);
    }

    #[test]
    fn empty_input() {
        assert!(keyword_lines(&[]).is_empty());
    }
}
