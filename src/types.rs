//! Data model shared by the parser, the merger and the shell.
//!
//! A [`Document`] is an ordered list of [`Section`]s plus the raw preamble
//! lines that precede the first header. Every [`Entry`] keeps the exact line it
//! came from in `raw`; the parsed fields exist only to drive merge decisions.

use serde::Serialize;

/// Trimmed text of the line that opens a user-owned block.
pub const CUSTOM_START_MARKER: &str = "# CUSTOM START";

/// Trimmed text of the line that closes a user-owned block.
pub const CUSTOM_END_MARKER: &str = "# CUSTOM END";

/// A parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Lines before the first `[Section]` header, verbatim.
    pub preamble: Vec<String>,
    /// Sections in file order. Names are not guaranteed to be unique.
    pub sections: Vec<Section>,
}

/// One `[Name]`-delimited block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text between the brackets, exactly as written.
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Whether any line of this section opens a custom block.
    pub fn has_custom_block(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.kind, LineKind::CustomStart))
    }

    /// Number of `key = value` lines.
    pub fn key_value_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_key_value()).count()
    }
}

/// How a single line inside a section was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// A `#` comment, or any line that matched nothing else.
    Comment,
    /// `key = value`, split at the first `=` and trimmed on both sides.
    KeyValue { key: String, value: String },
    Blank,
    CustomStart,
    CustomEnd,
}

/// One line inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: LineKind,
    /// The original line. Serialization always writes this back unchanged.
    pub raw: String,
    /// True strictly between a custom start marker and its end marker.
    /// Markers themselves are never flagged.
    pub custom: bool,
}

impl Entry {
    pub fn blank() -> Self {
        Self {
            kind: LineKind::Blank,
            raw: String::new(),
            custom: false,
        }
    }

    pub fn comment(raw: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Comment,
            raw: raw.into(),
            custom: false,
        }
    }

    pub fn is_key_value(&self) -> bool {
        matches!(self.kind, LineKind::KeyValue { .. })
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, LineKind::CustomStart | LineKind::CustomEnd)
    }

    /// The key of a `key = value` line, if it has a non-empty one.
    ///
    /// A line like `  = x` parses as a key/value pair with an empty key; it has
    /// no name and never matches another entry by name.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            LineKind::KeyValue { key, .. } if !key.is_empty() => Some(key),
            _ => None,
        }
    }

    /// The value of a `key = value` line.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            LineKind::KeyValue { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Entry-level counters for one emitted section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionChange {
    pub section: String,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl SectionChange {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            ..Self::default()
        }
    }
}

/// Output of one merge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Always `true` today; the merge has no failure mode.
    pub success: bool,
    /// The merged document, serialized.
    pub output: String,
    /// One entry per emitted section, in emission order.
    pub changes: Vec<SectionChange>,
}

/// Which merge strategy a syncable section gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// `[Proxy]`: base replaces the node list; preserved and custom nodes stay.
    ProxyList,
    /// `[Proxy Group]`: groups are reconciled by name.
    ProxyGroupList,
    /// Every other syncable section.
    Generic,
}

impl SyncPolicy {
    pub fn for_section(name: &str) -> Self {
        match name {
            "Proxy" => Self::ProxyList,
            "Proxy Group" => Self::ProxyGroupList,
            _ => Self::Generic,
        }
    }
}

/// A merge operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// Merge in memory and report the per-section summary.
    Preview,
    /// Merge in memory and print the full merged configuration.
    Show,
    /// Write the merged configuration back to the mod file.
    Apply { assume_yes: bool },
    /// Print a commented settings template.
    Template,
}
