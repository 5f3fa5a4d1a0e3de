//! Line-selection experiment: which failure-log lines each approach flags.
//!
//! Output is a `path,type,line` CSV. Rows are best-effort: a row that cannot
//! be written is dropped without interrupting the experiment.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator};
use tracing::{info, warn};

use crate::algorithm::{checked_diff, LogParser, ParserFactory, Variant};
use crate::bigram::novel_line_indices;
use crate::cache::TokenCache;
use crate::cancel::CancellationToken;
use crate::config::PairLayout;
use crate::error::{BenchError, Result};
use crate::keyword::keyword_lines;
use crate::types::Line;

/// Header line of selection and sweep CSVs.
pub const SELECTION_CSV_HEADER: &str = "path,type,line";

/// Label used for bigram baseline rows.
pub const BIGRAM_LABEL: &str = "bigram";

/// Label used for keyword baseline rows.
pub const KEYWORD_LABEL: &str = "keyword";

/// Label used for bigram rows computed over template lines.
pub const BIGRAM_DRAIN_LABEL: &str = "bigram-drain";

/// Best-effort writer for `path,type,line` rows.
///
/// Fields are quoted only when they contain a delimiter, quote or newline.
pub struct SelectionWriter<W: Write> {
    inner: csv::Writer<W>,
    dropped: usize,
}

impl<W: Write> SelectionWriter<W> {
    /// Wrap `inner` and write the header; a header failure is reported.
    pub fn new(inner: W) -> Result<Self> {
        let mut inner = csv::WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        inner.write_record(SELECTION_CSV_HEADER.split(','))?;
        inner.flush()?;
        Ok(Self { inner, dropped: 0 })
    }

    pub fn row(&mut self, path: &str, label: &str, line: usize) {
        let line = line.to_string();
        let written = self
            .inner
            .write_record([path, label, line.as_str()])
            .and_then(|()| self.inner.flush().map_err(csv::Error::from));
        if written.is_err() {
            self.dropped += 1;
        }
    }

    pub fn rows(&mut self, path: &str, label: &str, lines: &[usize]) {
        for line in lines {
            self.row(path, label, *line);
        }
    }

    /// Rows lost to write errors so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| BenchError::Io(err.into_error()))
    }
}

/// Read a path-list file: one dataset-relative directory per line.
pub fn read_path_list(file: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(file)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Parse both logs of `dir` with `parser`.
pub fn load_lines<P: LogParser>(
    parser: &P,
    dir: &Path,
    layout: &PairLayout,
) -> Result<(Vec<Line>, Vec<Line>)> {
    let left = parser.parse(&dir.join(&layout.success_file))?;
    let right = parser.parse(&dir.join(&layout.failure_file))?;
    Ok((left, right))
}

/// Template lines of both logs from a parser built by `factory`.
///
/// The success log is read once to seed the templates, then the failure log,
/// then the success log again so both sides see templates learned from both.
pub fn template_lines(
    factory: &ParserFactory,
    dir: &Path,
    layout: &PairLayout,
) -> Result<(Vec<Line>, Vec<Line>)> {
    let parser = factory();
    let success = dir.join(&layout.success_file);
    parser.parse(&success)?;
    let right = parser.parse(&dir.join(&layout.failure_file))?;
    let left = parser.parse(&success)?;
    Ok((left, right))
}

/// Counts reported at the end of a selection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub paths: usize,
    pub skipped: usize,
    pub failed_diffs: usize,
}

/// Runs every variant plus the bigram and keyword baselines on listed paths.
///
/// With a template parser, the bigram baseline also runs over template lines
/// (`bigram-drain`). Differs run without a deadline; this experiment targets
/// small corpora.
pub struct SelectionExperiment<'a, P: LogParser> {
    parser: &'a P,
    variants: &'a [Variant],
    layout: PairLayout,
    cache: Option<&'a TokenCache>,
    template_parser: Option<ParserFactory>,
}

impl<'a, P: LogParser> SelectionExperiment<'a, P> {
    pub fn new(parser: &'a P, variants: &'a [Variant], layout: PairLayout) -> Self {
        Self {
            parser,
            variants,
            layout,
            cache: None,
            template_parser: None,
        }
    }

    /// Also emit `bigram-drain` rows from parsers built by `factory`, one
    /// per path.
    pub fn with_template_parser(mut self, factory: ParserFactory) -> Self {
        self.template_parser = Some(factory);
        self
    }

    /// Clear `cache` after each path.
    pub fn with_cache(mut self, cache: &'a TokenCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn run<W: Write>(
        &self,
        dataset: &Path,
        paths: &[PathBuf],
        out: &mut SelectionWriter<W>,
    ) -> SelectionStats {
        let mut stats = SelectionStats::default();
        for path in paths {
            stats.paths += 1;
            let label = path.to_string_lossy();
            let (left, right) = match load_lines(self.parser, &dataset.join(path), &self.layout) {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(path = %label, error = %err, "unreadable log pair, skipping");
                    stats.skipped += 1;
                    continue;
                }
            };

            for variant in self.variants {
                let differ = variant.instantiate();
                let cancel = CancellationToken::new();
                match checked_diff(differ.as_ref(), &left, &right, variant.options(), &cancel) {
                    Ok(result) => out.rows(&label, variant.name(), &result.added_positions()),
                    Err(err) => {
                        warn!(path = %label, variant = variant.name(), error = %err, "diff failed");
                        stats.failed_diffs += 1;
                    }
                }
            }
            out.rows(&label, BIGRAM_LABEL, &novel_line_indices(&left, &right));
            if let Some(factory) = &self.template_parser {
                match template_lines(factory, &dataset.join(path), &self.layout) {
                    Ok((templ_left, templ_right)) => out.rows(
                        &label,
                        BIGRAM_DRAIN_LABEL,
                        &novel_line_indices(&templ_left, &templ_right),
                    ),
                    Err(err) => warn!(path = %label, error = %err, "template parse failed"),
                }
            }
            out.rows(&label, KEYWORD_LABEL, &keyword_lines(&right));

            if let Some(cache) = self.cache {
                cache.clear();
            }
            info!(path = %label, "selection done");
        }
        let _ = out.flush();
        stats
    }
}
