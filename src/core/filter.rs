// logsplit - core/filter.rs
//
// Include/skip filtering of assembled entries.
// Core layer: pure logic, no I/O.

use crate::core::model::first_line;
use regex::Regex;

/// Immutable snapshot of the filter conditions for one run.
/// Shared read-only across all entries.
#[derive(Debug, Clone, Default)]
pub struct FilterConditions {
    /// Evaluate every line independently instead of only the first line.
    pub per_line: bool,

    /// An entry/line passes when this list is empty or any pattern matches.
    pub include: Vec<Regex>,

    /// An entry/line fails when any pattern matches.
    pub skip: Vec<Regex>,
}

impl FilterConditions {
    /// Apply the conditions to one assembled entry.
    ///
    /// Whole-entry mode evaluates only the first line; a passing entry is
    /// returned unchanged. Per-line mode retains each line independently and
    /// returns the retained lines, or `None` when nothing survives — never
    /// an empty non-`None` result. Applying the filter twice with the same
    /// conditions yields the same result.
    pub fn filter(&self, entry: &str) -> Option<String> {
        if self.per_line {
            let kept: Vec<&str> = entry.lines().filter(|l| self.line_passes(l)).collect();
            if kept.is_empty() {
                None
            } else {
                let mut out = kept.join("\n");
                out.push('\n');
                Some(out)
            }
        } else if self.line_passes(first_line(entry)) {
            Some(entry.to_string())
        } else {
            None
        }
    }

    fn line_passes(&self, line: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|p| p.is_match(line)))
            && !self.skip.iter().any(|p| p.is_match(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(include: &[&str], skip: &[&str], per_line: bool) -> FilterConditions {
        FilterConditions {
            per_line,
            include: include.iter().map(|p| Regex::new(p).unwrap()).collect(),
            skip: skip.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }
    }

    const ENTRY: &str = "2024-01-01 ERROR boom\n\tat com.example.A.run(A.java:1)\n";

    #[test]
    fn test_no_conditions_passes_unchanged() {
        let c = conditions(&[], &[], false);
        assert_eq!(c.filter(ENTRY).as_deref(), Some(ENTRY));
    }

    #[test]
    fn test_whole_entry_include_checks_first_line_only() {
        // The include pattern matches only the stack frame line, which is
        // not the first line, so the whole entry is rejected.
        let c = conditions(&["com\\.example"], &[], false);
        assert_eq!(c.filter(ENTRY), None);

        let c = conditions(&["ERROR"], &[], false);
        assert_eq!(c.filter(ENTRY).as_deref(), Some(ENTRY));
    }

    #[test]
    fn test_whole_entry_skip_wins_over_include() {
        let c = conditions(&["ERROR"], &["boom"], false);
        assert_eq!(c.filter(ENTRY), None);
    }

    #[test]
    fn test_whole_entry_never_alters_content() {
        let c = conditions(&["ERROR"], &[], false);
        let out = c.filter(ENTRY).unwrap();
        assert_eq!(out, ENTRY, "whole-entry mode must pass content unchanged");
    }

    #[test]
    fn test_per_line_retains_matching_lines() {
        let c = conditions(&[], &["^\\s+at "], true);
        assert_eq!(c.filter(ENTRY).as_deref(), Some("2024-01-01 ERROR boom\n"));
    }

    #[test]
    fn test_per_line_all_rejected_is_none() {
        let c = conditions(&["nowhere"], &[], true);
        assert_eq!(c.filter(ENTRY), None, "must be None, not an empty string");
    }

    #[test]
    fn test_per_line_every_kept_line_satisfies_conditions() {
        let entry = "keep one\ndrop two\nkeep three\n";
        let c = conditions(&["keep"], &["three"], true);
        let out = c.filter(entry).unwrap();
        for line in out.lines() {
            assert!(line.contains("keep") && !line.contains("three"));
        }
        assert_eq!(out, "keep one\n");
    }

    #[test]
    fn test_filter_is_idempotent() {
        for per_line in [false, true] {
            let c = conditions(&["ERROR|at "], &["A\\.java:99"], per_line);
            let once = c.filter(ENTRY);
            let twice = once.as_deref().and_then(|t| c.filter(t));
            assert_eq!(once, twice, "per_line={per_line}");
        }
    }
}
