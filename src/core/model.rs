// logsplit - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across all layers.

use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Entry identity (output of classification)
// =============================================================================

/// Routing identity derived from one log entry: the class, method, and source
/// line of the code that produced it, plus a normalised message.
///
/// Any field may be absent. Produced fresh per entry and never mutated after
/// classification completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryIdentity {
    pub class: Option<String>,
    pub method: Option<String>,
    pub line: Option<String>,
    pub message: Option<String>,
}

impl EntryIdentity {
    /// True when the identity carries enough information to name an output
    /// file: class, method, and message. The line number is optional.
    pub fn is_routable(&self) -> bool {
        self.class.is_some() && self.method.is_some() && self.message.is_some()
    }
}

// =============================================================================
// Route mode
// =============================================================================

/// How completed entries are mapped to output files. Selected once per file
/// run; the two modes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMode {
    /// Group entries by their derived `EntryIdentity`.
    ByIdentity,

    /// Group entries by the date marker captured from their first line,
    /// using the input file's name as the base for output file names.
    ByDate { base_name: String },
}

// =============================================================================
// Per-file outcome
// =============================================================================

/// Counters for one input file's processing run.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    /// Entries routed and written to an output file.
    pub entries_written: u64,

    /// Entries discarded as duplicates of their immediate predecessor.
    pub entries_suppressed: u64,

    /// Entries removed entirely by include/skip filtering.
    pub entries_filtered: u64,

    /// Entries that could not be routed and were held back instead.
    pub entries_held: u64,

    /// Input bytes consumed (line bytes plus one newline per line).
    pub bytes_consumed: u64,

    /// True when the consumption-percentage cap stopped the run early,
    /// leaving part of the input unread.
    pub limit_hit: bool,
}

// =============================================================================
// Batch summary
// =============================================================================

/// Result of processing a whole batch of input files.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files processed to completion, with their counters.
    pub completed: Vec<(PathBuf, FileOutcome)>,

    /// Files whose worker failed. Other files in the batch are unaffected.
    pub failed: Vec<(PathBuf, crate::util::error::SplitError)>,

    /// Wall-clock duration of the batch.
    pub duration: Duration,
}

impl BatchSummary {
    /// Total entries written across all completed files.
    pub fn total_written(&self) -> u64 {
        self.completed.iter().map(|(_, o)| o.entries_written).sum()
    }
}

// =============================================================================
// Line helpers
// =============================================================================

/// First line of an entry's text, without its trailing newline.
pub fn first_line(text: &str) -> &str {
    nth_line(text, 0).unwrap_or("")
}

/// The `idx`-th line of an entry's text (zero-based), or `None` when the
/// entry has fewer lines.
pub fn nth_line(text: &str, idx: usize) -> Option<&str> {
    text.lines().nth(idx)
}
