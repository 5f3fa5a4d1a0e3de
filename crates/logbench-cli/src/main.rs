//! logbench - benchmark harness for log-difference algorithms
//!
//! ## Commands
//!
//! - `bench`: time every variant on every success/failure pair of a dataset
//! - `select`: record the failure-log lines each approach flags
//! - `sweep`: grid-sweep the similarity thresholds on listed pairs

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use logbench_adapters::{
    bag_variant, drain_parser_factory, drain_variant, reference_variants, GithubLogParser,
    SEED_VARIANT,
};
use logbench_core::{
    discover_pairs, init_tracing, read_path_list, write_summary_json, BenchConfig,
    BenchmarkController, BenchmarkWriter, ParameterSweep, ProgressLog, SelectionExperiment,
    SelectionWriter, TokenCache, Variant,
};

#[derive(Parser)]
#[command(name = "logbench")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark harness for log-difference algorithms", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time every variant on every log pair found under a dataset
    Bench {
        /// Dataset root directory
        dataset: PathBuf,

        /// Benchmark CSV output
        #[arg(short, long, default_value = "benchmark.csv")]
        output: PathBuf,

        /// Plain-text progress log
        #[arg(long, default_value = "log.txt")]
        log: PathBuf,

        /// Run summary JSON (default: next to the CSV)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Per-trial deadline in seconds
        #[arg(long, default_value_t = BenchConfig::default().timeout_secs)]
        timeout_secs: u64,

        /// Maximum trials per (directory, variant)
        #[arg(long, default_value_t = BenchConfig::default().trials)]
        trials: u32,

        /// Also benchmark the bag-of-lines differ
        #[arg(long)]
        bag: bool,
    },

    /// Record which failure-log lines each approach flags
    Select {
        /// Dataset root directory
        dataset: PathBuf,

        /// File listing dataset-relative directories, one per line
        paths: PathBuf,

        /// Selection CSV output
        #[arg(short, long, default_value = "selection.csv")]
        output: PathBuf,
    },

    /// Sweep the similarity thresholds over listed directories
    Sweep {
        /// Dataset root directory
        dataset: PathBuf,

        /// File listing dataset-relative directories, one per line
        paths: PathBuf,

        /// Parameter CSV output
        #[arg(short, long, default_value = "parameters.csv")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Bench {
            dataset,
            output,
            log,
            summary,
            timeout_secs,
            trials,
            bag,
        } => {
            let config = BenchConfig {
                timeout_secs,
                trials,
                ..BenchConfig::default()
            };
            let summary = summary.unwrap_or_else(|| summary_path(&output));
            cmd_bench(&dataset, &output, &log, &summary, config, bag).await
        }
        Commands::Select {
            dataset,
            paths,
            output,
        } => cmd_select(&dataset, &paths, &output),
        Commands::Sweep {
            dataset,
            paths,
            output,
        } => cmd_sweep(&dataset, &paths, &output),
    }
}

/// `benchmark.csv` -> `benchmark.summary.json`
fn summary_path(output: &Path) -> PathBuf {
    output.with_extension("summary.json")
}

async fn cmd_bench(
    dataset: &Path,
    output: &Path,
    log: &Path,
    summary_out: &Path,
    config: BenchConfig,
    bag: bool,
) -> Result<()> {
    let directories = discover_pairs(dataset, &config.layout)
        .with_context(|| format!("Failed to scan dataset {:?}", dataset))?;
    info!(directories = directories.len(), "dataset scanned");

    let cache = Arc::new(TokenCache::new());
    let parser = GithubLogParser::new();
    let mut variants = reference_variants(&cache);
    if bag {
        variants.push(bag_variant());
    }

    let file = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
    let mut writer = BenchmarkWriter::new(BufWriter::new(file))
        .with_context(|| format!("Failed to write header to {:?}", output))?;
    let mut progress = ProgressLog::stdout_and_file(log)
        .with_context(|| format!("Failed to create progress log {:?}", log))?;

    let controller = BenchmarkController::new(config, parser, variants, cache)
        .context("Invalid benchmark configuration")?;
    let summary = controller
        .run(dataset, &directories, &mut writer, &mut progress)
        .await
        .context("Benchmark aborted")?;

    write_summary_json(summary_out, &summary)
        .with_context(|| format!("Failed to write summary to {:?}", summary_out))?;

    println!("done");
    Ok(())
}

fn cmd_select(dataset: &Path, paths_file: &Path, output: &Path) -> Result<()> {
    let paths = read_path_list(paths_file)
        .with_context(|| format!("Failed to read path list {:?}", paths_file))?;

    let cache = Arc::new(TokenCache::new());
    let parser = GithubLogParser::new();
    let mut variants = reference_variants(&cache);
    variants.push(drain_variant());

    let mut out = open_selection(output)?;
    let stats = SelectionExperiment::new(&parser, &variants, BenchConfig::default().layout)
        .with_cache(&cache)
        .with_template_parser(drain_parser_factory())
        .run(dataset, &paths, &mut out);

    if out.dropped() > 0 {
        warn!(dropped = out.dropped(), "some rows could not be written");
    }
    info!(
        paths = stats.paths,
        skipped = stats.skipped,
        failed_diffs = stats.failed_diffs,
        "selection finished"
    );
    println!("done");
    Ok(())
}

fn cmd_sweep(dataset: &Path, paths_file: &Path, output: &Path) -> Result<()> {
    let paths = read_path_list(paths_file)
        .with_context(|| format!("Failed to read path list {:?}", paths_file))?;

    let cache = Arc::new(TokenCache::new());
    let parser = GithubLogParser::new();
    let variant = seed_variant(&cache)?;

    let mut out = open_selection(output)?;
    let swept = ParameterSweep::new(&variant).run(
        &parser,
        &BenchConfig::default().layout,
        dataset,
        &paths,
        &mut out,
        Some(&cache),
    );

    if out.dropped() > 0 {
        warn!(dropped = out.dropped(), "some rows could not be written");
    }
    info!(swept, listed = paths.len(), "sweep finished");
    println!("done");
    Ok(())
}

fn seed_variant(cache: &Arc<TokenCache>) -> Result<Variant> {
    reference_variants(cache)
        .into_iter()
        .find(|v| v.name() == SEED_VARIANT)
        .context("Similarity variant is not available")
}

fn open_selection(output: &Path) -> Result<SelectionWriter<BufWriter<File>>> {
    let file = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
    SelectionWriter::new(BufWriter::new(file))
        .with_context(|| format!("Failed to write header to {:?}", output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_bench_defaults() {
        let cli = Cli::try_parse_from(["logbench", "bench", "data"]).unwrap();
        match cli.command {
            Commands::Bench {
                dataset,
                output,
                log,
                summary,
                timeout_secs,
                trials,
                bag,
            } => {
                assert_eq!(dataset, PathBuf::from("data"));
                assert_eq!(output, PathBuf::from("benchmark.csv"));
                assert_eq!(log, PathBuf::from("log.txt"));
                assert!(summary.is_none());
                assert_eq!(timeout_secs, 600);
                assert_eq!(trials, 3);
                assert!(!bag);
            }
            _ => panic!("expected bench"),
        }
    }

    #[test]
    fn cli_requires_paths_file_for_select() {
        assert!(Cli::try_parse_from(["logbench", "select", "data"]).is_err());
        let cli = Cli::try_parse_from(["logbench", "select", "data", "paths.txt"]).unwrap();
        assert!(matches!(cli.command, Commands::Select { output, .. } if output == Path::new("selection.csv")));
    }

    #[test]
    fn cli_sweep_default_output() {
        let cli = Cli::try_parse_from(["logbench", "--verbose", "sweep", "d", "p"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Sweep { output, .. } if output == Path::new("parameters.csv")));
    }

    #[test]
    fn summary_sits_next_to_csv() {
        assert_eq!(
            summary_path(Path::new("out/benchmark.csv")),
            PathBuf::from("out/benchmark.summary.json")
        );
    }

    #[test]
    fn sweep_uses_similarity_variant() {
        let cache = Arc::new(TokenCache::new());
        assert_eq!(seed_variant(&cache).unwrap().name(), SEED_VARIANT);
    }

    #[test]
    fn select_writes_all_approaches() {
        let tmp = tempfile::tempdir().unwrap();
        let pair = tmp.path().join("org/repo/1");
        std::fs::create_dir_all(&pair).unwrap();
        std::fs::write(pair.join("success.log"), "build\ntest ok\n").unwrap();
        std::fs::write(pair.join("failure.log"), "build\nerror: boom\n").unwrap();
        let list = tmp.path().join("paths.txt");
        std::fs::write(&list, "org/repo/1\n").unwrap();
        let out = tmp.path().join("selection.csv");

        cmd_select(tmp.path(), &list, &out).unwrap();

        let csv = std::fs::read_to_string(&out).unwrap();
        assert!(csv.starts_with("path,type,line\n"));
        assert!(csv.contains("org/repo/1,lcs,1\n"));
        assert!(csv.contains("org/repo/1,keyword,1\n"));
        assert!(csv.contains("org/repo/1,bigram,1\n"));
        assert!(csv.contains("org/repo/1,bigram-drain,1\n"));
        assert!(csv.contains("org/repo/1,drainsim,1\n"));
    }
}
