// logsplit - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logsplit operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum SplitError {
    /// Pattern set loading, validation, or compilation failed.
    Pattern(PatternError),

    /// Batch precondition or orchestration failure.
    Batch(BatchError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
            Self::Batch(e) => write!(f, "Batch error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SplitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            Self::Batch(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Errors related to pattern set loading and validation.
///
/// Every variant here is fatal at startup: a run never begins with a
/// partially usable pattern set.
#[derive(Debug)]
pub enum PatternError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Pattern set file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A pattern named by the entry composition (or another required entry)
    /// is missing or empty.
    MissingPattern { name: String },

    /// A regex pattern is invalid.
    InvalidRegex {
        field: String,
        pattern: String,
        source: regex::Error,
    },

    /// A regex pattern exceeds the maximum allowed length.
    RegexTooLong {
        field: String,
        length: usize,
        max_length: usize,
    },

    /// A pattern is missing a capture group it is required to expose.
    MissingCapture {
        field: String,
        group: &'static str,
    },

    /// I/O error reading a pattern set file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Pattern set '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingPattern { name } => {
                write!(f, "Pattern not found: {name}")
            }
            Self::InvalidRegex {
                field,
                pattern,
                source,
            } => write!(f, "Invalid regex in '{field}' ('{pattern}'): {source}"),
            Self::RegexTooLong {
                field,
                length,
                max_length,
            } => write!(
                f,
                "Regex in '{field}' is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::MissingCapture { field, group } => {
                write!(f, "Pattern '{field}' has no '{group}' capture group")
            }
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading pattern set '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PatternError> for SplitError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Batch errors
// ---------------------------------------------------------------------------

/// Precondition violations and orchestration failures for a batch run.
#[derive(Debug)]
pub enum BatchError {
    /// The input path does not exist.
    InputNotFound { path: PathBuf },

    /// The output path exists but is not a directory.
    OutputNotADirectory { path: PathBuf },

    /// A non-append output target already exists (prevents silent overwrite).
    OutputExists { path: PathBuf },

    /// The worker thread pool could not be built.
    ThreadPool { source: rayon::ThreadPoolBuildError },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound { path } => {
                write!(f, "Input doesn't exist: '{}'", path.display())
            }
            Self::OutputNotADirectory { path } => {
                write!(f, "Output is not a directory: '{}'", path.display())
            }
            Self::OutputExists { path } => {
                write!(f, "Output file already exists: '{}'", path.display())
            }
            Self::ThreadPool { source } => {
                write!(f, "Failed to build worker pool: {source}")
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ThreadPool { source } => Some(source),
            _ => None,
        }
    }
}

impl From<BatchError> for SplitError {
    fn from(e: BatchError) -> Self {
        Self::Batch(e)
    }
}

/// Convenience type alias for logsplit results.
pub type Result<T> = std::result::Result<T, SplitError>;
