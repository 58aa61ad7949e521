// logsplit - core/splitter.rs
//
// Stream processing for one input file: segments a line stream into entries,
// runs the dedup/filter/route pipeline on each completed entry, and tracks
// consumption counters. Entries are processed strictly in input order and
// each line belongs to exactly one entry.

use crate::core::dedup;
use crate::core::filter::FilterConditions;
use crate::core::model::{FileOutcome, RouteMode};
use crate::core::patterns::PatternSet;
use crate::core::router::{EntryWriter, RouteOutcome};
use crate::util::error::{Result, SplitError};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-run processing switches.
#[derive(Debug, Clone, Default)]
pub struct SplitConfig {
    /// Suppress entries detected as duplicates of their predecessor.
    pub drop_duplicates: bool,

    /// Stop after consuming this percentage of the input, dropping whatever
    /// is buffered but not yet finalized. `None` processes the whole input.
    pub limit_percent: Option<u8>,
}

/// Process one input stream to completion (or to the consumption cap).
///
/// A line matching the entry-start pattern finalizes the buffered entry and
/// opens a new one; end of input finalizes the last. Every consumed line's
/// byte count (content plus one newline) is added to `consumed` so the
/// caller can observe progress concurrently. The output writer is closed
/// exactly once, whether processing succeeds or fails.
#[allow(clippy::too_many_arguments)]
pub fn split_stream<R: BufRead>(
    reader: R,
    input: &Path,
    total_bytes: u64,
    patterns: &PatternSet,
    conditions: &FilterConditions,
    mode: RouteMode,
    out_root: &Path,
    config: &SplitConfig,
    consumed: &AtomicU64,
) -> Result<FileOutcome> {
    let mut writer = EntryWriter::new(mode, out_root);
    let mut outcome = FileOutcome::default();

    let result = process(
        reader,
        input,
        total_bytes,
        patterns,
        conditions,
        config,
        consumed,
        &mut writer,
        &mut outcome,
    );
    let close = writer.finish();
    result.and(close)?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn process<R: BufRead>(
    reader: R,
    input: &Path,
    total_bytes: u64,
    patterns: &PatternSet,
    conditions: &FilterConditions,
    config: &SplitConfig,
    consumed: &AtomicU64,
    writer: &mut EntryWriter,
    outcome: &mut FileOutcome,
) -> Result<()> {
    let mut buffer = String::new();
    let mut previous: Option<String> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| SplitError::Io {
            path: input.to_path_buf(),
            operation: "read",
            source: e,
        })?;

        if patterns.is_entry_start(&line) && !buffer.is_empty() {
            finalize(
                &buffer,
                &mut previous,
                patterns,
                conditions,
                config,
                writer,
                outcome,
            )?;
            buffer.clear();
        }

        buffer.push_str(&line);
        buffer.push('\n');

        let bytes = (line.len() + 1) as u64;
        outcome.bytes_consumed += bytes;
        consumed.fetch_add(bytes, Ordering::Relaxed);

        if let Some(cap) = config.limit_percent {
            if total_bytes > 0 && outcome.bytes_consumed * 100 > u64::from(cap) * total_bytes {
                tracing::warn!(
                    file = %input.display(),
                    cap,
                    consumed = outcome.bytes_consumed,
                    "Consumption cap reached; dropping unfinalized entry and stopping"
                );
                outcome.limit_hit = true;
                return Ok(());
            }
        }
    }

    // End of input is an implicit entry boundary.
    if !buffer.is_empty() {
        finalize(
            &buffer,
            &mut previous,
            patterns,
            conditions,
            config,
            writer,
            outcome,
        )?;
    }
    Ok(())
}

/// Run one completed entry through the dedup/filter/route pipeline.
///
/// The previous-entry snapshot always advances to this entry's raw text,
/// regardless of whether the entry was suppressed, filtered, or held back.
fn finalize(
    raw: &str,
    previous: &mut Option<String>,
    patterns: &PatternSet,
    conditions: &FilterConditions,
    config: &SplitConfig,
    writer: &mut EntryWriter,
    outcome: &mut FileOutcome,
) -> Result<()> {
    let duplicate = dedup::is_duplicate(
        raw,
        previous.as_deref(),
        &patterns.duplicate_triggers,
        &patterns.caused_by,
    );

    if duplicate && config.drop_duplicates {
        outcome.entries_suppressed += 1;
    } else {
        match conditions.filter(raw) {
            Some(filtered) => match writer.route(&filtered, raw, patterns)? {
                RouteOutcome::Ready => {
                    writer.write_entry(&filtered)?;
                    writer.flush()?;
                    outcome.entries_written += 1;
                }
                RouteOutcome::HeldBack => outcome.entries_held += 1,
            },
            None => outcome.entries_filtered += 1,
        }
    }

    *previous = Some(raw.to_string());
    Ok(())
}
