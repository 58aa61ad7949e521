// logsplit - core/patterns.rs
//
// Pattern set loading, validation, and compilation.
// Core layer: accepts TOML strings, never touches the filesystem except in
// `load_from_path`, which reads one pattern set file for the launcher.
//
// A pattern set is the complete, immutable bundle of compiled patterns the
// engine consumes: the entry-start pattern (a concatenation of ordered named
// fragments), the ordered method-info list, the significant-stack-frame and
// caused-by patterns, duplicate triggers, message canonicalisation rules,
// and default filter conditions. All required entries are validated eagerly
// at load time; a run never starts with a partially usable set.

use crate::util::constants;
use crate::util::error::PatternError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML pattern set definition as deserialized from a .toml file.
/// This is validated and compiled into a `PatternSet` for runtime use.
#[derive(Debug, Deserialize)]
pub struct PatternSetDefinition {
    pub entry: EntryDef,

    /// Regex with `class`, `method`, and `line` captures, matched repeatedly
    /// against an entry's full text; the last match wins.
    pub significant_frame: String,

    /// Regex whose first capture group is the class name of a nested cause.
    pub caused_by: String,

    /// Patterns a first line must match before duplicate detection runs.
    #[serde(default)]
    pub duplicate_triggers: Vec<String>,

    #[serde(default)]
    pub method_info: Vec<MethodInfoDef>,

    #[serde(default)]
    pub message: MessageDef,

    #[serde(default)]
    pub filter: FilterDef,
}

#[derive(Debug, Deserialize)]
pub struct EntryDef {
    /// Ordered part names concatenated into the entry-start pattern.
    pub composition: Vec<String>,

    /// Named regex fragments referenced by `composition`.
    pub parts: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct MethodInfoDef {
    pub pattern: String,

    /// When true, the entry's literal second line is the message instead of
    /// the pattern's `message` capture group.
    #[serde(default)]
    pub message_on_second_line: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct MessageDef {
    #[serde(default)]
    pub canonical: Vec<CanonicalDef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CanonicalDef {
    /// Substring that marks a message as a known-noisy variant.
    pub contains: String,

    /// Canonical short label replacing the whole message.
    pub label: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct FilterDef {
    /// Include patterns applied in every mode unless overridden on the CLI.
    #[serde(default)]
    pub include: Vec<String>,

    /// Skip patterns applied in every mode unless overridden on the CLI.
    #[serde(default)]
    pub skip: Vec<String>,

    /// Include patterns used by error-extraction runs that supply none of
    /// their own (typically a severity match on ERROR/FATAL lines).
    #[serde(default)]
    pub error_include: Vec<String>,

    /// Evaluate include/skip per line instead of on the first line only.
    #[serde(default)]
    pub per_line: bool,
}

// =============================================================================
// Runtime representation
// =============================================================================

/// One method-info pattern, in priority order.
#[derive(Debug, Clone)]
pub struct MethodInfoPattern {
    pub regex: Regex,
    pub message_on_second_line: bool,
}

/// One message canonicalisation rule.
#[derive(Debug, Clone)]
pub struct CanonicalMessage {
    pub contains: String,
    pub label: String,
}

/// Compiled default filter conditions carried by a pattern set.
#[derive(Debug, Clone, Default)]
pub struct FilterDefaults {
    pub include: Vec<Regex>,
    pub skip: Vec<Regex>,
    pub error_include: Vec<Regex>,
    pub per_line: bool,
}

/// Runtime pattern set after TOML parsing and regex compilation.
/// Shared read-only across all entries of one run.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Entry boundary pattern: the ordered concatenation of the configured
    /// date/severity/thread/method/message fragments. Named capture groups
    /// `date`, `class`, `method`, `line`, `message` feed date routing and
    /// fallback classification.
    pub entry_start: Regex,

    /// Ordered method-info patterns; the first match against an entry's
    /// first line wins.
    pub method_info: Vec<MethodInfoPattern>,

    /// Multi-line pattern for significant stack frames.
    pub significant_frame: Regex,

    /// Multi-line pattern for nested-cause class names (capture group 1).
    pub caused_by: Regex,

    /// First-line patterns that make an entry eligible for dedup checks.
    pub duplicate_triggers: Vec<Regex>,

    /// Message canonicalisation rules, applied in order; first hit wins.
    pub canonical_messages: Vec<CanonicalMessage>,

    /// Default filter conditions for the launcher to consume.
    pub filter_defaults: FilterDefaults,
}

impl PatternSet {
    /// Tests a single line against the entry-start pattern. End of input is
    /// an implicit boundary and never reaches this check.
    pub fn is_entry_start(&self, line: &str) -> bool {
        self.entry_start.is_match(line)
    }

    /// Collapse known-noisy messages to their canonical short label so
    /// routing is not fragmented by incidental variable data.
    pub fn canonical_message(&self, message: &str) -> String {
        for rule in &self.canonical_messages {
            if message.contains(&rule.contains) {
                return rule.label.clone();
            }
        }
        message.to_string()
    }
}

// =============================================================================
// Parsing, validation, and compilation
// =============================================================================

/// Parse a TOML string into a `PatternSetDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_pattern_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<PatternSetDefinition, PatternError> {
    toml::from_str(toml_content).map_err(|e| PatternError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `PatternSetDefinition` and compile it into a runtime
/// `PatternSet`.
///
/// Validates:
/// - The entry composition is non-empty and every referenced part exists
/// - All regexes are valid and within size limits
/// - Each method-info pattern has a usable message source
/// - The significant-frame pattern exposes `class` and `method` captures
/// - The caused-by pattern has at least one capture group
pub fn validate_and_compile(def: PatternSetDefinition) -> Result<PatternSet, PatternError> {
    // --- Entry-start pattern -------------------------------------------------
    if def.entry.composition.is_empty() {
        return Err(PatternError::MissingPattern {
            name: "entry.composition".to_string(),
        });
    }

    let mut combined = String::new();
    for name in &def.entry.composition {
        match def.entry.parts.get(name) {
            Some(fragment) if !fragment.is_empty() => combined.push_str(fragment),
            _ => {
                return Err(PatternError::MissingPattern {
                    name: format!("entry.parts.{name}"),
                })
            }
        }
    }
    let entry_start = compile_regex("entry", &combined, false)?;

    for group in ["date", "method", "message"] {
        if !has_group(&entry_start, group) {
            tracing::warn!(
                group,
                "Entry pattern has no '{group}' capture group; \
                 routing that depends on it will hold entries back"
            );
        }
    }

    // --- Method-info patterns ------------------------------------------------
    let mut method_info = Vec::with_capacity(def.method_info.len());
    for (i, mi) in def.method_info.iter().enumerate() {
        let field = format!("method_info[{i}]");
        let regex = compile_regex(&field, &mi.pattern, false)?;
        if !mi.message_on_second_line && !has_group(&regex, "message") {
            return Err(PatternError::MissingCapture {
                field,
                group: "message",
            });
        }
        method_info.push(MethodInfoPattern {
            regex,
            message_on_second_line: mi.message_on_second_line,
        });
    }

    // --- Stack patterns ------------------------------------------------------
    if def.significant_frame.is_empty() {
        return Err(PatternError::MissingPattern {
            name: "significant_frame".to_string(),
        });
    }
    let significant_frame = compile_regex("significant_frame", &def.significant_frame, true)?;
    for group in ["class", "method"] {
        if !has_group(&significant_frame, group) {
            return Err(PatternError::MissingCapture {
                field: "significant_frame".to_string(),
                group,
            });
        }
    }

    if def.caused_by.is_empty() {
        return Err(PatternError::MissingPattern {
            name: "caused_by".to_string(),
        });
    }
    let caused_by = compile_regex("caused_by", &def.caused_by, true)?;
    if caused_by.captures_len() < 2 {
        return Err(PatternError::MissingCapture {
            field: "caused_by".to_string(),
            group: "1",
        });
    }

    // --- Lists ---------------------------------------------------------------
    let duplicate_triggers = compile_list(&def.duplicate_triggers, "duplicate_triggers")?;

    let filter_defaults = FilterDefaults {
        include: compile_list(&def.filter.include, "filter.include")?,
        skip: compile_list(&def.filter.skip, "filter.skip")?,
        error_include: compile_list(&def.filter.error_include, "filter.error_include")?,
        per_line: def.filter.per_line,
    };

    let canonical_messages = def
        .message
        .canonical
        .iter()
        .map(|c| CanonicalMessage {
            contains: c.contains.clone(),
            label: c.label.clone(),
        })
        .collect();

    Ok(PatternSet {
        entry_start,
        method_info,
        significant_frame,
        caused_by,
        duplicate_triggers,
        canonical_messages,
        filter_defaults,
    })
}

/// Compile a list of patterns, naming each element in error messages.
pub fn compile_list(patterns: &[String], field: &str) -> Result<Vec<Regex>, PatternError> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| compile_regex(&format!("{field}[{i}]"), p, false))
        .collect()
}

/// Compile a regex pattern with length validation to prevent ReDoS.
fn compile_regex(field: &str, pattern: &str, multi_line: bool) -> Result<Regex, PatternError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(PatternError::RegexTooLong {
            field: field.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    RegexBuilder::new(pattern)
        .multi_line(multi_line)
        .build()
        .map_err(|e| PatternError::InvalidRegex {
            field: field.to_string(),
            pattern: pattern.to_string(),
            source: e,
        })
}

fn has_group(regex: &Regex, name: &str) -> bool {
    regex.capture_names().flatten().any(|n| n == name)
}

// =============================================================================
// Loading
// =============================================================================

/// Embedded TOML content for the built-in default pattern set
/// (log4j-style `%d %p [%t] %M (%F:%L) - %m` entries).
pub fn builtin_pattern_source() -> &'static str {
    include_str!("../../patterns/log4j.toml")
}

/// Load and compile the built-in default pattern set.
pub fn load_builtin() -> Result<PatternSet, PatternError> {
    let path = PathBuf::from("<builtin>/log4j.toml");
    let def = parse_pattern_toml(builtin_pattern_source(), &path)?;
    validate_and_compile(def)
}

/// Load and compile a pattern set from a TOML file on disk.
pub fn load_from_path(path: &Path) -> Result<PatternSet, PatternError> {
    let meta = std::fs::metadata(path).map_err(|e| PatternError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if meta.len() > constants::MAX_PATTERN_FILE_SIZE {
        return Err(PatternError::FileTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max_size: constants::MAX_PATTERN_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| PatternError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let def = parse_pattern_toml(&content, path)?;
    validate_and_compile(def)
}

// =============================================================================
// Tests
// =============================================================================
