// logsplit - tests/e2e_split.rs
//
// End-to-end tests for the splitting pipeline.
//
// These tests exercise the real filesystem, real pattern compilation, real
// batch orchestration, and real output routing — no mocks, no stubs. Each
// test builds its inputs in a temp directory and inspects the files the run
// produced.

use logsplit::app::batch::{self, SplitMode, SplitOptions};
use logsplit::core::filter::FilterConditions;
use logsplit::core::patterns::{self, PatternSet};
use logsplit::core::splitter::SplitConfig;
use logsplit::util::error::{BatchError, SplitError};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

fn builtin() -> PatternSet {
    patterns::load_builtin().expect("built-in pattern set must compile")
}

fn options(mode: SplitMode) -> SplitOptions {
    SplitOptions {
        mode,
        split: SplitConfig::default(),
    }
}

/// Default filter conditions for an error-extraction run: the built-in set's
/// error include list, exactly as the launcher resolves it.
fn error_conditions(set: &PatternSet) -> FilterConditions {
    FilterConditions {
        per_line: set.filter_defaults.per_line,
        include: set.filter_defaults.error_include.clone(),
        skip: set.filter_defaults.skip.clone(),
    }
}

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write test input");
    path
}

/// Write and load a pattern set whose significant-frame pattern is scoped to
/// the application's own packages, the way a real deployment configures it.
fn scoped_set(dir: &Path) -> PatternSet {
    let toml = builtin_scoped_toml();
    let path = dir.join("patterns.toml");
    fs::write(&path, toml).expect("write pattern set");
    patterns::load_from_path(&path).expect("scoped pattern set must compile")
}

fn builtin_scoped_toml() -> String {
    patterns::builtin_pattern_source().replace(
        r"(?P<class>[a-zA-Z_$][\w$.]*)",
        r"(?P<class>com\.example\.[\w$.]*)",
    )
}

// =============================================================================
// Date splitting E2E
// =============================================================================

const MIXED_DAYS: &str = "\
2024-01-01 08:00:00,000 INFO [main] start (Main.java:10) - service starting\n\
2024-01-01 08:00:01,500 WARN [main] warmup (Main.java:22) - cache is cold\n\
\tretrying in 5s\n\
2024-01-02 09:15:00,000 INFO [main] start (Main.java:10) - new day\n\
2024-01-02 09:15:01,000 DEBUG [w-1] tick (Clock.java:3) - tick\n";

/// A by-date run fans one input out into one file per date marker, with
/// continuation lines staying attached to their entry.
#[test]
fn e2e_by_date_splits_into_per_day_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "app.log", MIXED_DAYS);
    let output = dir.path().join("out");

    let summary = batch::run_batch(
        &input,
        &output,
        &builtin(),
        &FilterConditions::default(),
        &options(SplitMode::ByDate),
    )
    .unwrap();

    assert_eq!(summary.completed.len(), 1);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.total_written(), 4);

    let day1 = fs::read_to_string(output.join("app.2024-01-01.log")).unwrap();
    let day2 = fs::read_to_string(output.join("app.2024-01-02.log")).unwrap();
    assert!(day1.contains("service starting"));
    assert!(day1.contains("\tretrying in 5s\n"));
    assert!(day2.contains("new day"));
    assert!(day2.contains("tick"));

    // Nothing is lost or reordered across the split.
    assert_eq!(format!("{day1}{day2}"), MIXED_DAYS);
}

/// A leading entry without a date marker is held back and prepended to the
/// first dated output file.
#[test]
fn e2e_by_date_preserves_dateless_preamble() {
    let dir = tempfile::tempdir().unwrap();
    let content = format!("Bootstrap banner, no timestamp\nstill the banner\n{MIXED_DAYS}");
    let input = write_input(dir.path(), "app.log", &content);
    let output = dir.path().join("out");

    batch::run_batch(
        &input,
        &output,
        &builtin(),
        &FilterConditions::default(),
        &options(SplitMode::ByDate),
    )
    .unwrap();

    let day1 = fs::read_to_string(output.join("app.2024-01-01.log")).unwrap();
    assert!(day1.starts_with("Bootstrap banner, no timestamp\nstill the banner\n"));
}

// =============================================================================
// Error extraction E2E
// =============================================================================

/// Two textually different stack traces with the same last significant
/// frame and the same message land in the same output file; non-error
/// entries are filtered out by the default error include list.
#[test]
fn e2e_by_error_groups_same_identity() {
    let dir = tempfile::tempdir().unwrap();
    let content = "\
2024-01-01 08:00:00,000 INFO [main] start (Main.java:10) - noise\n\
2024-01-01 08:00:05,000 ERROR [w-1] persist (Dao.java:77) - save failed\n\
java.sql.SQLException: connection closed\n\
\tat com.example.Dao.persist(Dao.java:77)\n\
\tat org.pool.Worker.call(Worker.java:31)\n\
2024-01-03 12:00:00,000 ERROR [w-9] persist (Dao.java:77) - save failed\n\
java.sql.SQLException: connection closed\n\
\tat org.server.Dispatch.handle(Dispatch.java:12)\n\
\tat com.example.Dao.persist(Dao.java:77)\n";
    let input = write_input(dir.path(), "app.log", content);
    let output = dir.path().join("out");

    // With the frame pattern scoped to com.example, the framework frames in
    // either trace never influence the identity.
    let set = scoped_set(dir.path());
    let summary = batch::run_batch(
        &input,
        &output,
        &set,
        &error_conditions(&set),
        &options(SplitMode::ByError),
    )
    .unwrap();
    assert_eq!(summary.total_written(), 2);

    let path = output
        .join("com.example.Dao")
        .join("persist")
        .join("77_save failed.log");
    let grouped = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("expected grouped output at {path:?}"));
    assert!(grouped.contains("[w-1]"));
    assert!(grouped.contains("[w-9]"));
    assert!(!grouped.contains("noise"));
}

/// Path-hostile characters in classification fields are sanitised before
/// they become path components, and long messages are truncated.
#[test]
fn e2e_by_error_sanitises_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let long_tail = "y".repeat(80);
    let content = format!(
        "2024-01-01 08:00:00,000 ERROR [m] fetch (Client.java:5) - GET /api/v1: timeout {long_tail}\n\
         \tat com.example.Client.fetch(Client.java:5)\n"
    );
    let input = write_input(dir.path(), "app.log", &content);
    let output = dir.path().join("out");

    let set = builtin();
    batch::run_batch(
        &input,
        &output,
        &set,
        &error_conditions(&set),
        &options(SplitMode::ByError),
    )
    .unwrap();

    // "GET /api/v1: timeout yyy..." is 64-char truncated, then / and :
    // become underscores.
    let message = format!("GET /api/v1: timeout {long_tail}");
    let truncated: String = message.chars().take(64).collect();
    let sanitised = truncated.replace(['/', ':'], "_");
    let path = output
        .join("com.example.Client")
        .join("fetch")
        .join(format!("5_{sanitised}.log"));
    assert!(path.is_file(), "expected sanitised path {path:?}");
}

/// Consecutive duplicate error entries collapse to the first occurrence
/// when duplicate dropping is enabled.
#[test]
fn e2e_drop_duplicates_suppresses_repeats() {
    let dir = tempfile::tempdir().unwrap();
    let entry = |thread: &str, ts: &str| {
        format!(
            "2024-01-01 {ts} ERROR [{thread}] run (Job.java:5) - job failed\n\
             Caused by: com.foo.Timeout: deadline exceeded\n\
             \tat com.example.Job.run(Job.java:5)\n"
        )
    };
    let content = format!(
        "{}{}{}",
        entry("a", "08:00:00,000"),
        entry("b", "08:00:01,000"),
        entry("c", "08:00:02,000")
    );
    let input = write_input(dir.path(), "app.log", &content);
    let output = dir.path().join("out");

    let set = builtin();
    let summary = batch::run_batch(
        &input,
        &output,
        &set,
        &error_conditions(&set),
        &SplitOptions {
            mode: SplitMode::ByError,
            split: SplitConfig {
                drop_duplicates: true,
                limit_percent: None,
            },
        },
    )
    .unwrap();

    assert_eq!(summary.total_written(), 1);
    let (_, outcome) = &summary.completed[0];
    assert_eq!(outcome.entries_suppressed, 2);

    let grouped = fs::read_to_string(
        output
            .join("com.example.Job")
            .join("run")
            .join("5_job failed.log"),
    )
    .unwrap();
    assert!(grouped.contains("[a]"));
    assert!(!grouped.contains("[b]"));
    assert!(!grouped.contains("[c]"));
}

// =============================================================================
// Batch behaviour E2E
// =============================================================================

/// A directory input processes each immediate file independently.
#[test]
fn e2e_directory_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logs");
    fs::create_dir(&input).unwrap();
    write_input(
        &input,
        "alpha.log",
        "2024-01-01 08:00:00,000 INFO [m] run (A.java:1) - from alpha\n",
    );
    write_input(
        &input,
        "beta.log",
        "2024-01-01 08:00:00,000 INFO [m] run (B.java:1) - from beta\n",
    );
    let output = dir.path().join("out");

    let summary = batch::run_batch(
        &input,
        &output,
        &builtin(),
        &FilterConditions::default(),
        &options(SplitMode::ByDate),
    )
    .unwrap();

    assert_eq!(summary.completed.len(), 2);
    assert!(output.join("alpha.2024-01-01.log").is_file());
    assert!(output.join("beta.2024-01-01.log").is_file());
}

/// A nonexistent input path fails the whole batch up front.
#[test]
fn e2e_missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = batch::run_batch(
        &dir.path().join("missing"),
        &dir.path().join("out"),
        &builtin(),
        &FilterConditions::default(),
        &options(SplitMode::ByDate),
    );
    assert!(
        matches!(
            result,
            Err(SplitError::Batch(BatchError::InputNotFound { .. }))
        ),
        "expected InputNotFound, got {result:?}"
    );
}

/// Re-running a by-date split over the same input appends to the existing
/// per-day files rather than failing or truncating them.
#[test]
fn e2e_by_date_rerun_appends() {
    let dir = tempfile::tempdir().unwrap();
    let line = "2024-01-01 08:00:00,000 INFO [m] run (A.java:1) - hello\n";
    let input = write_input(dir.path(), "app.log", line);
    let output = dir.path().join("out");

    for _ in 0..2 {
        batch::run_batch(
            &input,
            &output,
            &builtin(),
            &FilterConditions::default(),
            &options(SplitMode::ByDate),
        )
        .unwrap();
    }

    let day = fs::read_to_string(output.join("app.2024-01-01.log")).unwrap();
    assert_eq!(day, format!("{line}{line}"));
}

// =============================================================================
// Merge E2E
// =============================================================================

/// Merging a directory concatenates its files in name order into a new file
/// and refuses to overwrite an existing target.
#[test]
fn e2e_merge_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("parts");
    fs::create_dir(&input).unwrap();
    write_input(&input, "2_second.log", "part two\n");
    write_input(&input, "1_first.log", "part one\n");

    let target = dir.path().join("merged.log");
    batch::merge(&input, &target).unwrap();
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "part one\npart two\n"
    );

    let result = batch::merge(&input, &target);
    assert!(
        matches!(
            result,
            Err(SplitError::Batch(BatchError::OutputExists { .. }))
        ),
        "expected OutputExists, got {result:?}"
    );
}
