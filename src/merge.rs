//! Merge a base document into a user-modified ("mod") document.
//!
//! The mod document drives the output order. Each mod section either goes
//! through the [`SyncPolicy`] for its name, when the section is syncable and
//! base has it too, or is kept untouched. Base sections missing from mod are
//! appended at the end. The preamble always comes from mod.
//!
//! Both inputs are borrowed immutably; every emitted entry is a clone of an
//! input line except the blank separators and the sync comment the policies
//! insert.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::parser::{get_custom_entries, get_proxy_names, get_section, serialize_config};
use crate::types::{Document, Entry, MergeResult, Section, SectionChange, SyncPolicy};

/// Sections whose content is refreshed from base.
pub const SYNCABLE_SECTIONS: [&str; 7] = [
    "Proxy",
    "Proxy Group",
    "Rule",
    "URL Rewrite",
    "Script",
    "Panel",
    "Host",
];

/// Proxy nodes that always come from the mod file.
pub const PRESERVED_PROXY_NAMES: [&str; 2] = ["Direct", "Block"];

/// Comment line placed before content copied from base.
pub const SYNC_COMMENT: &str = "# Synced from base config";

/// Merge `base` into `mod_doc` and serialize the result.
pub fn merge_configs(base: &Document, mod_doc: &Document) -> MergeResult {
    let (merged, changes) = merge_documents(base, mod_doc);
    MergeResult {
        success: true,
        output: serialize_config(&merged),
        changes,
    }
}

/// Merge `base` into `mod_doc`, returning the merged document and one change
/// record per emitted section (mod sections first, then base-only sections).
pub fn merge_documents(base: &Document, mod_doc: &Document) -> (Document, Vec<SectionChange>) {
    let mut sections = Vec::with_capacity(mod_doc.sections.len());
    let mut changes = Vec::with_capacity(mod_doc.sections.len());

    for mod_section in &mod_doc.sections {
        let base_section = is_syncable(&mod_section.name)
            .then(|| get_section(base, &mod_section.name))
            .flatten();

        let (section, change) = match base_section {
            Some(base_section) => merge_section(mod_section, base_section),
            None => keep_section(mod_section),
        };
        sections.push(section);
        changes.push(change);
    }

    for base_section in &base.sections {
        if get_section(mod_doc, &base_section.name).is_some() {
            continue;
        }
        debug!(section = %base_section.name, "appending section only present in base");
        let change = SectionChange {
            added: base_section.entries.len(),
            ..SectionChange::new(&base_section.name)
        };
        sections.push(base_section.clone());
        changes.push(change);
    }

    let merged = Document {
        preamble: mod_doc.preamble.clone(),
        sections,
    };
    (merged, changes)
}

/// Whether `name` is refreshed from base when both sides have it.
pub fn is_syncable(name: &str) -> bool {
    SYNCABLE_SECTIONS.contains(&name)
}

fn is_preserved(name: &str) -> bool {
    PRESERVED_PROXY_NAMES.contains(&name)
}

fn keep_section(mod_section: &Section) -> (Section, SectionChange) {
    debug!(section = %mod_section.name, "keeping section from mod");
    let change = SectionChange {
        unchanged: mod_section.entries.len(),
        ..SectionChange::new(&mod_section.name)
    };
    (mod_section.clone(), change)
}

fn merge_section(mod_section: &Section, base_section: &Section) -> (Section, SectionChange) {
    let policy = SyncPolicy::for_section(&mod_section.name);
    let (entries, change) = match policy {
        SyncPolicy::ProxyList => merge_proxy_list(mod_section, base_section),
        SyncPolicy::ProxyGroupList => merge_proxy_groups(mod_section, base_section),
        SyncPolicy::Generic => merge_generic(mod_section, base_section),
    };
    debug!(
        section = %mod_section.name,
        ?policy,
        added = change.added,
        removed = change.removed,
        unchanged = change.unchanged,
        "synced section from base"
    );
    let section = Section {
        name: mod_section.name.clone(),
        entries,
    };
    (section, change)
}

/// Push every custom block of `section` (markers included) onto `out`,
/// counting the interior lines.
fn carry_custom_blocks(section: &Section, out: &mut Vec<Entry>, change: &mut SectionChange) {
    for entry in get_custom_entries(section) {
        if entry.custom {
            change.unchanged += 1;
        }
        out.push(entry.clone());
    }
}

/// `[Proxy]`: preserved nodes and custom blocks from mod, then base's node list.
fn merge_proxy_list(mod_section: &Section, base_section: &Section) -> (Vec<Entry>, SectionChange) {
    let mut change = SectionChange::new(&mod_section.name);
    let mut entries = Vec::new();

    // A preserved node inside a custom block is emitted here and again with its block.
    for entry in &mod_section.entries {
        if entry.name().is_some_and(is_preserved) {
            entries.push(entry.clone());
            change.unchanged += 1;
        }
    }
    entries.push(Entry::blank());

    carry_custom_blocks(mod_section, &mut entries, &mut change);
    if mod_section.has_custom_block() {
        entries.push(Entry::blank());
    }
    entries.push(Entry::comment(SYNC_COMMENT));

    let mod_names: HashSet<&str> = get_proxy_names(mod_section).into_iter().collect();
    for entry in &base_section.entries {
        if !entry.is_key_value() || entry.name().is_some_and(is_preserved) {
            continue;
        }
        entries.push(entry.clone());
        if entry.name().is_some_and(|name| mod_names.contains(name)) {
            change.unchanged += 1;
        } else {
            change.added += 1;
        }
    }

    let base_names: HashSet<&str> = get_proxy_names(base_section).into_iter().collect();
    change.removed = mod_section
        .entries
        .iter()
        .filter(|e| e.is_key_value() && !e.custom)
        .filter(|e| !e.name().is_some_and(is_preserved))
        .filter(|e| !e.name().is_some_and(|name| base_names.contains(name)))
        .count();

    (entries, change)
}

/// Base groups keyed by name, in first-seen order; a later duplicate replaces
/// the definition but keeps the first position.
struct GroupIndex<'a> {
    slots: Vec<Option<&'a Entry>>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> GroupIndex<'a> {
    fn new(section: &'a Section) -> Self {
        let mut index = Self {
            slots: Vec::new(),
            by_name: HashMap::new(),
        };
        for entry in &section.entries {
            let Some(name) = entry.name() else { continue };
            match index.by_name.get(name) {
                Some(&slot) => index.slots[slot] = Some(entry),
                None => {
                    index.by_name.insert(name, index.slots.len());
                    index.slots.push(Some(entry));
                }
            }
        }
        index
    }

    /// Take the base definition of `name`; `None` once it has been taken.
    fn take(&mut self, name: &str) -> Option<&'a Entry> {
        let slot = *self.by_name.get(name)?;
        self.slots[slot].take()
    }

    fn remaining(self) -> impl Iterator<Item = &'a Entry> {
        self.slots.into_iter().flatten()
    }
}

/// `[Proxy Group]`: walk mod, swapping in base's version of every known group.
fn merge_proxy_groups(
    mod_section: &Section,
    base_section: &Section,
) -> (Vec<Entry>, SectionChange) {
    let mut change = SectionChange::new(&mod_section.name);
    let mut entries = Vec::with_capacity(mod_section.entries.len());
    let mut base_groups = GroupIndex::new(base_section);

    for entry in &mod_section.entries {
        if entry.custom {
            entries.push(entry.clone());
            change.unchanged += 1;
            continue;
        }
        match entry.name() {
            Some(name) => {
                let kept = base_groups.take(name).unwrap_or(entry);
                entries.push(kept.clone());
                change.unchanged += 1;
            }
            _ => entries.push(entry.clone()),
        }
    }

    for entry in base_groups.remaining() {
        entries.push(entry.clone());
        change.added += 1;
    }

    (entries, change)
}

/// Every other syncable section: base wins, except for custom blocks.
fn merge_generic(mod_section: &Section, base_section: &Section) -> (Vec<Entry>, SectionChange) {
    let mut change = SectionChange::new(&mod_section.name);

    if !mod_section.has_custom_block() {
        change.added = base_section.key_value_count();
        change.removed = mod_section.key_value_count();
        return (base_section.entries.clone(), change);
    }

    let mut entries = Vec::new();
    carry_custom_blocks(mod_section, &mut entries, &mut change);
    entries.push(Entry::blank());
    entries.push(Entry::comment(SYNC_COMMENT));
    entries.extend(base_section.entries.iter().cloned());
    change.added = base_section.entries.len();

    (entries, change)
}
