//! Selection experiment and parameter sweep over a small on-disk dataset.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use logbench_core::{
    ActionType, BenchError, CancellationToken, DiffError, DiffOptions, DiffResult, Line,
    LogDiffer, LogParser, ParameterSweep, PairLayout, ParserFactory, Result,
    SelectionExperiment, SelectionWriter, TokenCache, Variant, BIGRAM_DRAIN_LABEL,
};

struct PlainParser;

impl LogParser for PlainParser {
    fn parse(&self, path: &Path) -> Result<Vec<Line>> {
        let content = std::fs::read_to_string(path).map_err(|err| BenchError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(content
            .lines()
            .enumerate()
            .map(|(i, l)| Line::new(l, i))
            .collect())
    }
}

/// Replaces digits with a wildcard and records which files it read.
struct DigitMasking {
    id: usize,
    reads: Arc<Mutex<Vec<(usize, String)>>>,
}

impl LogParser for DigitMasking {
    fn parse(&self, path: &Path) -> Result<Vec<Line>> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.reads.lock().unwrap().push((self.id, name));
        Ok(PlainParser
            .parse(path)?
            .into_iter()
            .map(|line| {
                let masked: String = line
                    .value
                    .chars()
                    .map(|c| if c.is_ascii_digit() { '*' } else { c })
                    .collect();
                Line::new(masked, line.index)
            })
            .collect())
    }
}

/// Right lines absent from the left are added; with a strict rewrite
/// threshold every right line counts as added.
struct Membership;

impl LogDiffer for Membership {
    fn diff(
        &self,
        left: &[Line],
        right: &[Line],
        options: &DiffOptions,
        _cancel: &CancellationToken,
    ) -> std::result::Result<DiffResult, DiffError> {
        let strict = options.rewrite_min > 0.5;
        let right_actions = right
            .iter()
            .map(|r| {
                if strict || !left.iter().any(|l| l.value == r.value) {
                    ActionType::Added
                } else {
                    ActionType::Unchanged
                }
            })
            .collect();
        Ok(DiffResult::new(
            vec![ActionType::Unchanged; left.len()],
            right_actions,
        ))
    }
}

struct Failing;

impl LogDiffer for Failing {
    fn diff(
        &self,
        _left: &[Line],
        _right: &[Line],
        _options: &DiffOptions,
        _cancel: &CancellationToken,
    ) -> std::result::Result<DiffResult, DiffError> {
        Err(DiffError::Internal("unsupported input".into()))
    }
}

fn dataset() -> (tempfile::TempDir, Vec<PathBuf>) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("org/repo/1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("success.log"), "A\nB\nC\n").unwrap();
    std::fs::write(dir.join("failure.log"), "A\nB\nD\nE\n").unwrap();
    (tmp, vec![PathBuf::from("org/repo/1"), PathBuf::from("org/repo/missing")])
}

fn membership() -> Variant {
    Variant::shared("member", Arc::new(Membership), DiffOptions::default())
}

#[test]
fn test_selection_emits_every_approach() {
    let (tmp, paths) = dataset();
    let variants = vec![
        membership(),
        Variant::shared("broken", Arc::new(Failing), DiffOptions::default()),
    ];
    let cache = TokenCache::new();
    cache.tokens("warm entry");

    let mut out = SelectionWriter::new(Vec::new()).unwrap();
    let stats = SelectionExperiment::new(&PlainParser, &variants, PairLayout::default())
        .with_cache(&cache)
        .run(tmp.path(), &paths, &mut out);

    let csv = String::from_utf8(out.into_inner().unwrap()).unwrap();
    assert_eq!(
        csv,
        "path,type,line\n\
         org/repo/1,member,2\n\
         org/repo/1,member,3\n\
         org/repo/1,bigram,1\n\
         org/repo/1,bigram,2\n\
         org/repo/1,bigram,3\n"
    );
    assert_eq!(stats.paths, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed_diffs, 1);
    assert!(cache.is_empty());
}

#[test]
fn test_sweep_writes_one_block_per_cell() {
    let (tmp, paths) = dataset();
    let variant = membership();
    let sweep = ParameterSweep::new(&variant).with_axis(vec![0.0, 1.0]);

    let mut out = SelectionWriter::new(Vec::new()).unwrap();
    let swept = sweep.run(
        &PlainParser,
        &PairLayout::default(),
        tmp.path(),
        &paths,
        &mut out,
        None,
    );

    let csv = String::from_utf8(out.into_inner().unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(swept, 1);
    // lenient rewrite threshold: only the new lines
    assert_eq!(
        &rows[..4],
        &[
            "org/repo/1,l0.0-q0.0,2",
            "org/repo/1,l0.0-q0.0,3",
            "org/repo/1,l0.0-q1.0,2",
            "org/repo/1,l0.0-q1.0,3",
        ]
    );
    // strict rewrite threshold: every right line, for both q values
    assert_eq!(rows.len(), 4 + 8);
    assert!(rows[4..].iter().all(|r| r.contains(",l1.0-q")));
}

#[test]
fn test_sweep_covers_full_grid() {
    let variant = membership();
    let sweep = ParameterSweep::new(&variant);
    let cells: Vec<(f64, f64)> = sweep.cells().collect();
    assert_eq!(cells.len(), 121);
    assert_eq!(cells[0], (0.0, 0.0));
    assert_eq!(cells[1], (0.0, 0.1));
    assert_eq!(cells[120], (1.0, 1.0));

    let mut seen = 0;
    let left = logbench_core::lines_from(["x"]);
    let right = logbench_core::lines_from(["y"]);
    sweep.sweep_pair(&left, &right, |cell| {
        seen += 1;
        assert_eq!(cell.flagged, vec![0]);
    });
    assert_eq!(seen, 121);
}

#[test]
fn test_failed_sweep_cell_flags_nothing() {
    let variant = Variant::shared("broken", Arc::new(Failing), DiffOptions::default());
    let sweep = ParameterSweep::new(&variant).with_axis(vec![0.5]);
    let left = logbench_core::lines_from(["x"]);
    let mut cells = Vec::new();
    sweep.sweep_pair(&left, &left, |cell| cells.push(cell));
    assert_eq!(cells.len(), 1);
    assert!(cells[0].flagged.is_empty());
    assert_eq!(cells[0].label(), "l0.5-q0.5");
}

#[test]
fn test_selection_with_template_parser_emits_bigram_drain_rows() {
    let tmp = tempfile::tempdir().unwrap();
    for rel in ["ci/1", "ci/2"] {
        let dir = tmp.path().join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("success.log"), "fetch 1\nfetch 2\nbuild\n").unwrap();
        std::fs::write(dir.join("failure.log"), "fetch 7\nfetch 8\nbuild\nerror\n").unwrap();
    }
    let paths = vec![PathBuf::from("ci/1"), PathBuf::from("ci/2")];

    let reads = Arc::new(Mutex::new(Vec::new()));
    let built = Arc::new(Mutex::new(0usize));
    let factory: ParserFactory = {
        let reads = Arc::clone(&reads);
        let built = Arc::clone(&built);
        Arc::new(move || {
            let mut built = built.lock().unwrap();
            *built += 1;
            Box::new(DigitMasking {
                id: *built,
                reads: Arc::clone(&reads),
            }) as Box<dyn LogParser>
        })
    };

    let variants: Vec<Variant> = Vec::new();
    let mut out = SelectionWriter::new(Vec::new()).unwrap();
    SelectionExperiment::new(&PlainParser, &variants, PairLayout::default())
        .with_template_parser(factory)
        .run(tmp.path(), &paths, &mut out);

    let csv = String::from_utf8(out.into_inner().unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).filter(|r| r.starts_with("ci/1,")).collect();
    // raw lines: every failure line is in a new pairing; templates: only the tail
    assert_eq!(
        rows,
        vec![
            "ci/1,bigram,0",
            "ci/1,bigram,1",
            "ci/1,bigram,2",
            "ci/1,bigram,3",
            "ci/1,bigram-drain,2",
            "ci/1,bigram-drain,3",
            "ci/1,keyword,3",
        ]
    );
    assert!(csv.contains(&format!("ci/2,{},3", BIGRAM_DRAIN_LABEL)));

    // one parser per path, reading success, failure, success
    assert_eq!(*built.lock().unwrap(), 2);
    let reads = reads.lock().unwrap();
    let first: Vec<&str> = reads
        .iter()
        .filter(|(id, _)| *id == 1)
        .map(|(_, name)| name.as_str())
        .collect();
    assert_eq!(first, vec!["success.log", "failure.log", "success.log"]);
}
