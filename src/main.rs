// logsplit - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Pattern set loading (built-in or user-supplied)
// 4. Batch launch and exit status

use clap::{Args, Parser, Subcommand};
use logsplit::app::batch::{self, SplitMode, SplitOptions};
use logsplit::core::filter::FilterConditions;
use logsplit::core::patterns::{self, PatternSet};
use logsplit::core::splitter::SplitConfig;
use logsplit::util::error::Result;
use logsplit::util::{constants, logging};
use std::path::{Path, PathBuf};

/// logsplit - Multi-line log re-splitter.
///
/// Segments log files into entries and re-splits them into per-date files,
/// or extracts error entries grouped by their failure identity.
#[derive(Parser, Debug)]
#[command(name = "logsplit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-split each input into one output file per date marker.
    ByDate {
        /// Input log file, or a directory of log files.
        input: PathBuf,

        /// Output directory (created if absent).
        output: PathBuf,

        #[command(flatten)]
        opts: SplitArgs,
    },

    /// Extract error entries into one output file per failure identity.
    ByError {
        /// Input log file, or a directory of log files.
        input: PathBuf,

        /// Output directory (created if absent).
        output: PathBuf,

        #[command(flatten)]
        opts: SplitArgs,
    },

    /// Concatenate input files (in name order) into a single new file.
    Merge {
        /// Input log file, or a directory of log files.
        input: PathBuf,

        /// Output file; must not already exist.
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Pattern set TOML file (defaults to the built-in log4j set).
    #[arg(short = 'p', long = "patterns")]
    patterns: Option<PathBuf>,

    /// Include filter pattern; repeatable. Overrides the set's defaults.
    #[arg(short = 'i', long = "include")]
    include: Vec<String>,

    /// Skip filter pattern; repeatable. Overrides the set's defaults.
    #[arg(short = 's', long = "skip")]
    skip: Vec<String>,

    /// Evaluate filters against every line instead of each entry's first line.
    #[arg(long = "per-line")]
    per_line: bool,

    /// Drop entries that repeat their immediate predecessor.
    #[arg(long = "drop-duplicates")]
    drop_duplicates: bool,

    /// Stop each file after consuming this percentage of its input.
    #[arg(long = "limit-percent", value_parser = clap::value_parser!(u8).range(1..=100))]
    limit_percent: Option<u8>,
}

fn main() {
    let cli = Cli::parse();

    // Initialise logging subsystem
    logging::init(cli.debug);

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "logsplit starting"
    );

    match run(cli.command) {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("Error: {failed} input file(s) failed; see log output");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Execute the selected subcommand, returning the number of failed files.
fn run(command: Command) -> Result<usize> {
    match command {
        Command::ByDate {
            input,
            output,
            opts,
        } => split(&input, &output, SplitMode::ByDate, &opts),
        Command::ByError {
            input,
            output,
            opts,
        } => split(&input, &output, SplitMode::ByError, &opts),
        Command::Merge { input, output } => {
            batch::merge(&input, &output)?;
            Ok(0)
        }
    }
}

fn split(input: &Path, output: &Path, mode: SplitMode, opts: &SplitArgs) -> Result<usize> {
    let set = load_pattern_set(opts.patterns.as_deref())?;
    let conditions = build_conditions(&set, mode, opts)?;
    let options = SplitOptions {
        mode,
        split: SplitConfig {
            drop_duplicates: opts.drop_duplicates,
            limit_percent: opts.limit_percent,
        },
    };

    let summary = batch::run_batch(input, output, &set, &conditions, &options)?;

    tracing::info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        written = summary.total_written(),
        duration_ms = summary.duration.as_millis() as u64,
        "Batch finished"
    );
    Ok(summary.failed.len())
}

fn load_pattern_set(path: Option<&Path>) -> Result<PatternSet> {
    let set = match path {
        Some(p) => {
            tracing::info!(file = %p.display(), "Loading pattern set");
            patterns::load_from_path(p)?
        }
        None => patterns::load_builtin()?,
    };
    Ok(set)
}

/// Resolve the effective filter conditions: CLI patterns override the set's
/// defaults, and error-extraction runs that supply no include of their own
/// fall back to the set's error include list.
fn build_conditions(
    set: &PatternSet,
    mode: SplitMode,
    opts: &SplitArgs,
) -> Result<FilterConditions> {
    let include = if !opts.include.is_empty() {
        patterns::compile_list(&opts.include, "--include")?
    } else if mode == SplitMode::ByError && !set.filter_defaults.error_include.is_empty() {
        set.filter_defaults.error_include.clone()
    } else {
        set.filter_defaults.include.clone()
    };

    let skip = if !opts.skip.is_empty() {
        patterns::compile_list(&opts.skip, "--skip")?
    } else {
        set.filter_defaults.skip.clone()
    };

    Ok(FilterConditions {
        per_line: opts.per_line || set.filter_defaults.per_line,
        include,
        skip,
    })
}
