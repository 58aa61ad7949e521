// logsplit - app/batch.rs
//
// Batch orchestration: input discovery, worker pool, per-file job registry,
// background progress reporting, and the merge utility.
//
// Files are independent units of work; one file's failure never aborts the
// rest of the batch.

use crate::core::filter::FilterConditions;
use crate::core::model::{BatchSummary, FileOutcome, RouteMode};
use crate::core::patterns::PatternSet;
use crate::core::router;
use crate::core::splitter::{self, SplitConfig};
use crate::util::constants;
use crate::util::error::{BatchError, Result, SplitError};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Which output organisation a batch run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// One output file per date marker, named after the input file.
    ByDate,

    /// One output file per classified error identity.
    ByError,
}

/// Everything a batch run needs beyond the input/output paths.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub mode: SplitMode,
    pub split: SplitConfig,
}

// =============================================================================
// Job registry
// =============================================================================

/// Shared progress state for one input file's job. Workers update `consumed`
/// and `done`; the progress task only reads. All fields are lock-free, so a
/// reader may observe a value that is an instant stale, which is fine for
/// reporting.
pub struct JobHandle {
    /// Input file name, for log lines.
    pub name: String,

    /// Input size in bytes, captured at discovery time.
    pub total_bytes: u64,

    /// Bytes consumed so far.
    pub consumed: AtomicU64,

    /// Set once when the worker finishes, successfully or not.
    pub done: AtomicBool,
}

impl JobHandle {
    fn new(name: String, total_bytes: u64) -> Self {
        Self {
            name,
            total_bytes,
            consumed: AtomicU64::new(0),
            done: AtomicBool::new(false),
        }
    }

    /// Completion percentage, clamped to 0..=100. Empty inputs report 100.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let consumed = self.consumed.load(Ordering::Relaxed);
        ((consumed * 100) / self.total_bytes).min(100) as u8
    }
}

// =============================================================================
// Batch run
// =============================================================================

/// Process every file under `input` (or `input` itself when it is a regular
/// file), writing routed output under the `output` directory.
pub fn run_batch(
    input: &Path,
    output: &Path,
    patterns: &PatternSet,
    conditions: &FilterConditions,
    options: &SplitOptions,
) -> Result<BatchSummary> {
    let started = Instant::now();

    let files = collect_input_files(input)?;
    router::ensure_output_dir(output)?;

    tracing::info!(
        files = files.len(),
        input = %input.display(),
        output = %output.display(),
        mode = ?options.mode,
        "Starting batch"
    );

    let mut jobs = Vec::with_capacity(files.len());
    for path in &files {
        let total = std::fs::metadata(path)
            .map_err(|e| SplitError::Io {
                path: path.clone(),
                operation: "stat",
                source: e,
            })?
            .len();
        jobs.push(Arc::new(JobHandle::new(display_name(path), total)));
    }
    let jobs = Arc::new(jobs);

    let shutdown = Arc::new(AtomicBool::new(false));
    let progress = spawn_progress_task(Arc::clone(&jobs), Arc::clone(&shutdown));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads())
        .build()
        .map_err(|e| BatchError::ThreadPool { source: e })?;

    let results: Vec<(PathBuf, Result<FileOutcome>)> = pool.install(|| {
        files
            .par_iter()
            .enumerate()
            .map(|(i, path)| {
                let job = &jobs[i];
                let result = process_file(path, output, patterns, conditions, options, job);
                job.done.store(true, Ordering::Relaxed);
                (path.clone(), result)
            })
            .collect()
    });

    shutdown.store(true, Ordering::Relaxed);
    if progress.join().is_err() {
        tracing::warn!("Progress task panicked");
    }

    let mut summary = BatchSummary {
        duration: started.elapsed(),
        ..Default::default()
    };
    for (path, result) in results {
        match result {
            Ok(outcome) => {
                tracing::info!(
                    file = %path.display(),
                    written = outcome.entries_written,
                    suppressed = outcome.entries_suppressed,
                    filtered = outcome.entries_filtered,
                    held = outcome.entries_held,
                    limit_hit = outcome.limit_hit,
                    "File complete"
                );
                summary.completed.push((path, outcome));
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "File failed");
                summary.failed.push((path, e));
            }
        }
    }
    Ok(summary)
}

fn process_file(
    path: &Path,
    output: &Path,
    patterns: &PatternSet,
    conditions: &FilterConditions,
    options: &SplitOptions,
    job: &JobHandle,
) -> Result<FileOutcome> {
    let file = File::open(path).map_err(|e| SplitError::Io {
        path: path.to_path_buf(),
        operation: "open",
        source: e,
    })?;
    let mode = match options.mode {
        SplitMode::ByDate => RouteMode::ByDate {
            base_name: job.name.clone(),
        },
        SplitMode::ByError => RouteMode::ByIdentity,
    };
    splitter::split_stream(
        BufReader::new(file),
        path,
        job.total_bytes,
        patterns,
        conditions,
        mode,
        output,
        &options.split,
        &job.consumed,
    )
}

// =============================================================================
// Input discovery
// =============================================================================

/// Resolve the input path into the list of files to process. A directory
/// contributes its immediate regular files (no recursion), sorted by name
/// for deterministic job order.
fn collect_input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(BatchError::InputNotFound {
            path: input.to_path_buf(),
        }
        .into());
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SplitError::Io {
            path: input.to_path_buf(),
            operation: "scan",
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Worker pool and progress
// =============================================================================

/// Worker count: max(floor, detected CPUs) times the multiplier. Workers are
/// I/O-bound most of the time, so oversubscription is deliberate.
fn worker_threads() -> usize {
    let cpus = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.max(constants::MIN_WORKER_BASE) * constants::WORKER_THREAD_MULTIPLIER
}

/// Background task that periodically logs per-file progress and an ETA
/// extrapolated from elapsed time. Exits promptly once `shutdown` is set.
fn spawn_progress_task(
    jobs: Arc<Vec<Arc<JobHandle>>>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let started = Instant::now();
        loop {
            let mut slept = 0;
            while slept < constants::PROGRESS_LOG_INTERVAL_MS {
                if shutdown.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(Duration::from_millis(
                    constants::PROGRESS_SHUTDOWN_CHECK_INTERVAL_MS,
                ));
                slept += constants::PROGRESS_SHUTDOWN_CHECK_INTERVAL_MS;
            }

            let elapsed = started.elapsed();
            for job in jobs.iter() {
                if job.done.load(Ordering::Relaxed) {
                    continue;
                }
                let percent = job.percent();
                if percent == 0 {
                    tracing::info!(file = %job.name, percent, "Progress");
                } else {
                    let eta = elapsed.mul_f64(100.0 / f64::from(percent) - 1.0);
                    tracing::info!(
                        file = %job.name,
                        percent,
                        eta_secs = eta.as_secs(),
                        "Progress"
                    );
                }
            }
        }
    })
}

// =============================================================================
// Merge
// =============================================================================

/// Concatenate the input (a file, or a directory's immediate files in name
/// order) into a single new output file. Refuses to overwrite an existing
/// target. Returns the number of bytes written.
pub fn merge(input: &Path, output: &Path) -> Result<u64> {
    let files = collect_input_files(input)?;
    let mut writer = router::create_output(output)?;

    let mut total = 0u64;
    for path in &files {
        let mut reader = File::open(path).map_err(|e| SplitError::Io {
            path: path.clone(),
            operation: "open",
            source: e,
        })?;
        total += io::copy(&mut reader, &mut writer).map_err(|e| SplitError::Io {
            path: output.to_path_buf(),
            operation: "write",
            source: e,
        })?;
    }
    writer.flush().map_err(|e| SplitError::Io {
        path: output.to_path_buf(),
        operation: "flush",
        source: e,
    })?;

    tracing::info!(
        files = files.len(),
        bytes = total,
        output = %output.display(),
        "Merge complete"
    );
    Ok(total)
}
