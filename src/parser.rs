//! Line-based parser and serializer for the proxy config dialect.
//!
//! Parsing is a fold over `\n`-separated lines. The accumulator carries the
//! finished sections, the section being filled and whether the scan is inside
//! a custom block. Every line lands somewhere: unrecognized lines become
//! comments, so [`serialize_config`] reproduces the input exactly.

use std::borrow::Cow;

use tracing::warn;

use crate::types::{CUSTOM_END_MARKER, CUSTOM_START_MARKER, Document, Entry, LineKind, Section};

/// Scan state threaded through the fold.
#[derive(Debug, Default)]
struct Scan {
    document: Document,
    current: Option<Section>,
    in_custom: bool,
}

impl Scan {
    fn step(mut self, line: &str) -> Self {
        if let Some(name) = section_header(line) {
            self.flush();
            self.current = Some(Section::new(name));
            self.in_custom = false;
            return self;
        }

        match self.current.as_mut() {
            None => self.document.preamble.push(line.to_string()),
            Some(section) => {
                let (entry, in_custom) = classify(line, self.in_custom);
                section.entries.push(entry);
                self.in_custom = in_custom;
            }
        }
        self
    }

    fn flush(&mut self) {
        if let Some(section) = self.current.take() {
            if self.in_custom {
                warn!(
                    section = %section.name,
                    "custom block is not closed; it runs to the end of the section"
                );
            }
            self.document.sections.push(section);
        }
    }

    fn finish(mut self) -> Document {
        self.flush();
        self.document
    }
}

/// Parse raw text into a [`Document`]. Never fails.
pub fn parse_config(text: &str) -> Document {
    text.split('\n').fold(Scan::default(), Scan::step).finish()
}

/// Write a [`Document`] back to text: preamble, then each `[name]` header
/// followed by the raw lines of its entries, joined with `\n`.
pub fn serialize_config(document: &Document) -> String {
    let mut lines: Vec<Cow<'_, str>> = document
        .preamble
        .iter()
        .map(|line| Cow::Borrowed(line.as_str()))
        .collect();

    for section in &document.sections {
        lines.push(Cow::Owned(format!("[{}]", section.name)));
        lines.extend(section.entries.iter().map(|e| Cow::Borrowed(e.raw.as_str())));
    }

    lines.join("\n")
}

/// First section called `name`, if any.
pub fn get_section<'a>(document: &'a Document, name: &str) -> Option<&'a Section> {
    document.sections.iter().find(|s| s.name == name)
}

/// Keys of every named `key = value` line, in order, duplicates included.
pub fn get_proxy_names(section: &Section) -> Vec<&str> {
    section.entries.iter().filter_map(Entry::name).collect()
}

/// Lines inside custom blocks, together with the block markers.
pub fn get_custom_entries(section: &Section) -> Vec<&Entry> {
    section
        .entries
        .iter()
        .filter(|e| e.custom || e.is_marker())
        .collect()
}

/// Everything [`get_custom_entries`] leaves out.
pub fn get_non_custom_entries(section: &Section) -> Vec<&Entry> {
    section
        .entries
        .iter()
        .filter(|e| !e.custom && !e.is_marker())
        .collect()
}

/// `[name]` with a non-empty name and nothing around the brackets.
fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?
        .strip_suffix(']')
        .filter(|name| !name.is_empty())
}

/// Trim whitespace and byte order marks from both ends.
fn trim_line(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Classify one line inside a section. Returns the entry and the custom-block
/// state for the next line.
fn classify(line: &str, in_custom: bool) -> (Entry, bool) {
    let trimmed = trim_line(line);

    let (kind, custom, next) = if trimmed == CUSTOM_START_MARKER {
        (LineKind::CustomStart, false, true)
    } else if trimmed == CUSTOM_END_MARKER {
        (LineKind::CustomEnd, false, false)
    } else if trimmed.is_empty() {
        (LineKind::Blank, in_custom, in_custom)
    } else if trimmed.starts_with('#') {
        (LineKind::Comment, in_custom, in_custom)
    } else if let Some((key, value)) = line.split_once('=').filter(|(key, _)| !key.is_empty()) {
        let kind = LineKind::KeyValue {
            key: trim_line(key).to_string(),
            value: trim_line(value).to_string(),
        };
        (kind, in_custom, in_custom)
    } else {
        (LineKind::Comment, in_custom, in_custom)
    };

    let entry = Entry {
        kind,
        raw: line.to_string(),
        custom,
    };
    (entry, next)
}
