// logsplit - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logsplit";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Pattern set limits
// =============================================================================

/// Maximum size of a pattern set TOML file in bytes.
pub const MAX_PATTERN_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Routing limits
// =============================================================================

/// Maximum length in characters of the message fragment used in a routed
/// output file name. Longer messages are truncated before the `.log` suffix.
pub const ROUTE_NAME_MAX_LENGTH: usize = 64;

/// Characters replaced with `_` when a classification field becomes a path
/// component.
pub const ROUTE_UNSAFE_CHARS: &[char] = &['\\', '/', ':', '<', '>'];

/// Extension given to every routed output file.
pub const ROUTE_FILE_EXTENSION: &str = "log";

// =============================================================================
// Worker pool
// =============================================================================

/// Lower bound applied to the detected CPU count before sizing the pool.
pub const MIN_WORKER_BASE: usize = 2;

/// Pool size multiplier: threads = max(MIN_WORKER_BASE, cpus) * this.
pub const WORKER_THREAD_MULTIPLIER: usize = 2;

// =============================================================================
// Progress reporting
// =============================================================================

/// How often the background progress task logs per-file percentages (ms).
pub const PROGRESS_LOG_INTERVAL_MS: u64 = 15_000;

/// How often the shutdown flag is checked within each progress sleep (ms).
/// The progress thread wakes every this many ms so batch completion is not
/// delayed by a full reporting interval.
pub const PROGRESS_SHUTDOWN_CHECK_INTERVAL_MS: u64 = 100;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
