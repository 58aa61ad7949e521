// logsplit - core/router.rs
//
// Output routing: maps a classified entry (or its date marker) to a concrete
// output path and manages the writer lifecycle, including held-back text.
//
// At most one writer is open per `EntryWriter` at any time; replacing the
// target closes the previous writer. Switching never implicitly flushes
// buffered entry text; the stream processor flushes after every write.

use crate::core::classify;
use crate::core::model::{first_line, RouteMode};
use crate::core::patterns::PatternSet;
use crate::util::constants;
use crate::util::error::{BatchError, Result, SplitError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// What the router decided for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A writer is open for the entry's target; the caller may write.
    Ready,

    /// The entry could not be routed; its raw text was appended to the
    /// pending prefix and will ride along with the next successful write.
    HeldBack,
}

/// Routing state for one input file's run.
pub struct EntryWriter {
    mode: RouteMode,
    out_root: PathBuf,

    /// Date marker of the currently open target (date routing only).
    date: Option<String>,

    /// The currently open output writer, if any.
    writer: Option<BufWriter<File>>,

    /// Path of the currently open target, for error context.
    target: Option<PathBuf>,

    /// Raw text of entries that could not be routed, prepended to the next
    /// entry that is successfully routed and written. Best-effort: lost if
    /// the run ends while text is still held back.
    pending_prefix: String,
}

impl EntryWriter {
    pub fn new(mode: RouteMode, out_root: &Path) -> Self {
        Self {
            mode,
            out_root: out_root.to_path_buf(),
            date: None,
            writer: None,
            target: None,
            pending_prefix: String::new(),
        }
    }

    /// Resolve the output target for one entry, switching the open writer if
    /// needed. `entry` is the (possibly filtered) text that will be written;
    /// `raw` is the entry's original text, which is what gets held back when
    /// routing fails.
    pub fn route(&mut self, entry: &str, raw: &str, patterns: &PatternSet) -> Result<RouteOutcome> {
        match &self.mode {
            RouteMode::ByIdentity => self.route_by_identity(entry, raw, patterns),
            RouteMode::ByDate { base_name } => {
                let base_name = base_name.clone();
                self.route_by_date(&base_name, entry, raw, patterns)
            }
        }
    }

    fn route_by_identity(
        &mut self,
        entry: &str,
        raw: &str,
        patterns: &PatternSet,
    ) -> Result<RouteOutcome> {
        let identity = classify::classify(entry, patterns);
        let (Some(class), Some(method), Some(message)) = (
            identity.class.as_deref(),
            identity.method.as_deref(),
            identity.message.as_deref(),
        ) else {
            tracing::warn!(
                head = first_line(raw),
                "Cannot derive an output file name; holding entry back"
            );
            self.pending_prefix.push_str(raw);
            return Ok(RouteOutcome::HeldBack);
        };

        let dir = self
            .out_root
            .join(sanitize(class))
            .join(sanitize(method));
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, "create directory", e))?;

        let mut name = sanitize(&truncate_chars(message, constants::ROUTE_NAME_MAX_LENGTH));
        if let Some(line) = identity.line.as_deref().filter(|l| !l.is_empty()) {
            name = format!("{line}_{name}");
        }
        let path = dir.join(format!("{name}.{}", constants::ROUTE_FILE_EXTENSION));

        self.open_target(path)?;
        Ok(RouteOutcome::Ready)
    }

    fn route_by_date(
        &mut self,
        base_name: &str,
        entry: &str,
        raw: &str,
        patterns: &PatternSet,
    ) -> Result<RouteOutcome> {
        let marker = patterns
            .entry_start
            .captures(first_line(entry))
            .and_then(|caps| caps.name("date"))
            .map(|m| m.as_str().to_string());

        if marker == self.date {
            return if self.writer.is_some() {
                Ok(RouteOutcome::Ready)
            } else {
                // No marker seen yet on this file (both are unset).
                self.hold_back_dateless(raw);
                Ok(RouteOutcome::HeldBack)
            };
        }

        self.date = marker.clone();
        match marker {
            Some(date) => {
                let path = self.out_root.join(date_log_name(base_name, &date));
                self.open_target(path)?;
                Ok(RouteOutcome::Ready)
            }
            None => {
                // The marker disappeared while a date was being tracked;
                // the previous target is no longer valid.
                self.writer = None;
                self.target = None;
                self.hold_back_dateless(raw);
                Ok(RouteOutcome::HeldBack)
            }
        }
    }

    fn hold_back_dateless(&mut self, raw: &str) {
        tracing::warn!(
            head = first_line(raw),
            "Entry carries no date marker; holding entry back"
        );
        self.pending_prefix.push_str(raw);
    }

    /// Open `path` in append mode, closing any previously open writer.
    fn open_target(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            tracing::debug!(file = %path.display(), "Creating new file");
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| io_err(&path, "open", e))?;
        self.writer = Some(BufWriter::new(file));
        self.target = Some(path);
        Ok(())
    }

    /// Write one entry's text, prefixed by any held-back text.
    pub fn write_entry(&mut self, text: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if !self.pending_prefix.is_empty() {
            writer
                .write_all(self.pending_prefix.as_bytes())
                .map_err(|e| io_err_opt(&self.target, "write", e))?;
            self.pending_prefix.clear();
        }
        writer
            .write_all(text.as_bytes())
            .map_err(|e| io_err_opt(&self.target, "write", e))
    }

    /// Flush pending buffered writes to the current target.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| io_err_opt(&self.target, "flush", e))?;
        }
        Ok(())
    }

    /// Flush and close the current writer. Safe to call when no writer is
    /// open; the writer is closed exactly once either way.
    pub fn finish(&mut self) -> Result<()> {
        let result = self.flush();
        self.writer = None;
        self.target = None;
        result
    }

    /// True while unrouted entry text is waiting to ride along with the
    /// next successful write.
    pub fn has_pending(&self) -> bool {
        !self.pending_prefix.is_empty()
    }
}

// =============================================================================
// Path helpers
// =============================================================================

/// Replace path-hostile characters in a routing component with `_`.
pub fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if constants::ROUTE_UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Output file name for a date-routed target: `<base-stem>.<date>.log`.
fn date_log_name(base_name: &str, date: &str) -> String {
    let stem = Path::new(base_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base_name);
    format!("{stem}.{date}.{}", constants::ROUTE_FILE_EXTENSION)
}

// =============================================================================
// Output bootstrap
// =============================================================================

/// Ensure the batch output directory exists, creating it if absent.
/// A non-directory at the path is a fatal precondition violation.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else if path.exists() {
        Err(BatchError::OutputNotADirectory {
            path: path.to_path_buf(),
        }
        .into())
    } else {
        fs::create_dir_all(path).map_err(|e| io_err(path, "create directory", e))
    }
}

/// Open a non-append output target. Fails when the file already exists so an
/// earlier run's output is never silently overwritten.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(BatchError::OutputExists {
            path: path.to_path_buf(),
        }
        .into()),
        Err(e) => Err(io_err(path, "create", e)),
    }
}

fn io_err(path: &Path, operation: &'static str, source: io::Error) -> SplitError {
    SplitError::Io {
        path: path.to_path_buf(),
        operation,
        source,
    }
}

fn io_err_opt(path: &Option<PathBuf>, operation: &'static str, source: io::Error) -> SplitError {
    SplitError::Io {
        path: path.clone().unwrap_or_default(),
        operation,
        source,
    }
}

// =============================================================================
// Tests
// =============================================================================
