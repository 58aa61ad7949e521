// logsplit - core/dedup.rs
//
// Duplicate detection against the depth-1 history.
// Core layer: pure logic, no I/O.
//
// Same-root-cause failures vary in timestamp and thread name but share an
// exception class name somewhere in the stack, so substring containment of
// a few extracted tokens is a cheap equivalence proxy. It tolerates false
// positives across unrelated messages that happen to share a substring, and
// false negatives when the repeated cause appears only beyond the checked
// tokens.

use crate::core::model::{first_line, nth_line};
use regex::Regex;

/// Decide whether `entry` repeats the immediately preceding finalized entry.
///
/// Returns false when there is no previous entry or when the entry's first
/// line matches none of the duplicate-trigger patterns. Otherwise collects
/// candidate tokens — the second line's text after its first `": "`
/// delimiter (or the whole second line), plus every class name captured by
/// the caused-by pattern anywhere in the entry — and reports a duplicate
/// iff any token occurs as a literal substring of the previous entry's text.
pub fn is_duplicate(
    entry: &str,
    previous: Option<&str>,
    triggers: &[Regex],
    caused_by: &Regex,
) -> bool {
    let Some(previous) = previous else {
        return false;
    };

    let head = first_line(entry);
    if !triggers.iter().any(|p| p.is_match(head)) {
        return false;
    }

    let mut tokens: Vec<&str> = Vec::new();

    if let Some(second) = nth_line(entry, 1) {
        tokens.push(match second.find(": ") {
            Some(i) => &second[i + 2..],
            None => second,
        });
    }

    for caps in caused_by.captures_iter(entry) {
        if let Some(class) = caps.get(1) {
            tokens.push(class.as_str());
        }
    }

    tokens.iter().any(|t| previous.contains(t))
}
