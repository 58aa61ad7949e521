// logsplit - core/classify.rs
//
// Two-phase, priority-ordered classification of an entry into a routing
// identity. Core layer: pure logic, no I/O.

use crate::core::model::{first_line, nth_line, EntryIdentity};
use crate::core::patterns::PatternSet;
use regex::Captures;

/// Derive the routing identity for one assembled entry.
///
/// Phase 1 scans the ordered method-info patterns against the entry's first
/// line; the first match wins (list order is a priority, not a strength
/// ranking). The message comes from that pattern's `message` capture, or
/// from the entry's literal second line when the pattern is flagged
/// `message_on_second_line`. The significant-stack-frame pattern is then
/// matched repeatedly against the full entry text; each match overwrites the
/// previous class/method/line, so the last matching frame determines the
/// identity.
///
/// Phase 2 (fallback, when phase 1 matched nothing or produced no method)
/// re-matches the first line against the entry-start pattern and takes
/// class/method/line/message from its named groups.
///
/// The final message is canonicalised in either phase. A missing method or
/// message means the entry is unclassifiable; the caller decides whether to
/// hold it back.
pub fn classify(entry: &str, patterns: &PatternSet) -> EntryIdentity {
    let head = first_line(entry);
    let mut identity = EntryIdentity::default();
    let mut matched = false;

    for info in &patterns.method_info {
        if let Some(caps) = info.regex.captures(head) {
            matched = true;
            identity.message = if info.message_on_second_line {
                nth_line(entry, 1).map(str::to_string)
            } else {
                capture(&caps, "message")
            };
            break;
        }
    }

    if matched {
        for caps in patterns.significant_frame.captures_iter(entry) {
            identity.class = capture(&caps, "class");
            identity.method = capture(&caps, "method");
            identity.line = capture(&caps, "line");
        }
    }

    if !matched || identity.method.is_none() {
        if let Some(caps) = patterns.entry_start.captures(head) {
            identity.class = capture(&caps, "class");
            identity.method = capture(&caps, "method");
            identity.line = capture(&caps, "line");
            identity.message = capture(&caps, "message");
        }
    }

    if let Some(message) = identity.message.take() {
        identity.message = Some(patterns.canonical_message(&message));
    }

    identity
}

fn capture(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}
