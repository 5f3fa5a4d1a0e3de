//! Reader for GitHub Actions job logs.
//!
//! Each physical line loses its leading runner timestamp and any ANSI color
//! sequences; lines that are blank afterwards are dropped. Kept lines are
//! indexed from zero in file order.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use logbench_core::{BenchError, Line, LogParser, Result};

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z ?").expect("timestamp pattern")
    })
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b?\[(?:\d+)?(?:;\d+)*m").expect("ansi pattern"))
}

/// Clean one raw log line; `None` when nothing but whitespace remains.
pub fn clean_line(raw: &str) -> Option<String> {
    let content = timestamp_re().replace(raw, "");
    let cleaned = ansi_re().replace_all(&content, "");
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}

/// Clean every line of `content`.
pub fn parse_content(content: &str) -> Vec<Line> {
    content
        .lines()
        .filter_map(clean_line)
        .enumerate()
        .map(|(index, value)| Line::new(value, index))
        .collect()
}

/// Log parser for GitHub Actions output. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct GithubLogParser;

impl GithubLogParser {
    pub fn new() -> Self {
        Self
    }
}

impl LogParser for GithubLogParser {
    fn parse(&self, path: &Path) -> Result<Vec<Line>> {
        let bytes = std::fs::read(path).map_err(|err| BenchError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let lines = parse_content(&String::from_utf8_lossy(&bytes));
        debug!(path = ?path, lines = lines.len(), "log parsed");
        Ok(lines)
    }
}
