//! logbench core library
//!
//! Harness for comparing log-difference algorithms over paired success and
//! failure logs: dataset discovery, deadline-bounded trials, median timing,
//! structural diff metrics, novelty baselines and parameter sweeps.
//!
//! Parsing and diffing are collaborators behind the [`LogParser`] and
//! [`LogDiffer`] traits.

pub mod algorithm;
pub mod bigram;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod controller;
pub mod error;
pub mod keyword;
pub mod metrics;
pub mod obs;
pub mod progress;
pub mod record;
pub mod runner;
pub mod scan;
pub mod selection;
pub mod summary;
pub mod sweep;
pub mod telemetry;
pub mod types;

pub use algorithm::{checked_diff, DifferFactory, LogDiffer, LogParser, ParserFactory, Variant};
pub use bigram::{bigrams, novel_line_indices, novel_vocabulary};
pub use cache::TokenCache;
pub use cancel::CancellationToken;
pub use config::{BenchConfig, PairLayout};
pub use controller::{variant_order, BenchmarkController};
pub use error::{BenchError, DiffError, Result};
pub use keyword::{keyword_lines, FAILURE_KEYWORDS};
pub use metrics::{count_blocks, Metrics};
pub use progress::{MemoryGauge, MemorySample, ProgressLog};
pub use record::{
    representative_duration, BenchmarkRecord, BenchmarkWriter, BENCHMARK_CSV_HEADER,
};
pub use runner::{TimeoutRunner, TrialOutcome};
pub use scan::{discover_pairs, is_pair_dir, relative_label};
pub use selection::{
    read_path_list, template_lines, SelectionExperiment, SelectionWriter, BIGRAM_DRAIN_LABEL,
    BIGRAM_LABEL, KEYWORD_LABEL, SELECTION_CSV_HEADER,
};
pub use summary::{write_summary_json, RunSummary, TrialCounters};
pub use sweep::{cell_label, sweep_axis, ParameterSweep, SweepCell};
pub use telemetry::init_tracing;
pub use types::{lines_from, ActionType, DiffOptions, DiffResult, Line, Metric};

/// logbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
