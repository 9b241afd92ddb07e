//! Merge a hand-edited proxy configuration with its upstream subscription.
//!
//! Subscription-style proxy configs (Surge and friends) are plain text:
//! `[Section]` headers, `key = value` lines, `#` comments. Users copy the
//! upstream file, tweak it, and then lose their edits the next time the
//! provider rotates nodes. Confmerge takes the upstream **base** file and the
//! user's **mod** file and produces a new mod file that keeps the user's work
//! while refreshing what the provider manages.
//!
//! ```ignore
//! let base = confmerge::parse_config(&base_text);
//! let user = confmerge::parse_config(&mod_text);
//! let result = confmerge::merge_configs(&base, &user);
//! println!("{}", confmerge::generate_diff_summary(&result.changes));
//! std::fs::write(mod_path, result.output)?;
//! ```
//!
//! # Lossless parsing
//!
//! [`parse_config`] never fails. Every line keeps its original text, and
//! lines the parser does not understand are kept as comments, so
//! `serialize_config(&parse_config(text)) == text` for any input. Lines carried
//! through a merge are written back byte for byte: spacing, trailing comments
//! and `#!include` directives survive.
//!
//! # Custom blocks
//!
//! Anything between `# CUSTOM START` and `# CUSTOM END` inside a section
//! belongs to the user and is never replaced. An unterminated block runs to
//! the end of its section.
//!
//! # Which sections sync
//!
//! Only `Proxy`, `Proxy Group`, `Rule`, `URL Rewrite`, `Script`, `Panel` and
//! `Host` are refreshed, and only when base has them too. Every other mod
//! section (e.g. `[General]`) is kept as-is. Sections only base has are
//! appended. The mod preamble wins over base's.
//!
//! Each syncable section gets one [`SyncPolicy`]:
//!
//! - **`[Proxy]`**: `Direct`/`Block` and custom blocks come from mod; the rest
//!   of the node list is replaced wholesale by base's.
//! - **`[Proxy Group]`**: groups are matched by name. Known groups take base's
//!   definition, unknown ones are the user's own and stay, new base groups are
//!   appended. Nothing is ever counted as removed.
//! - **everything else**: base wins. If mod has a custom block, the block is
//!   kept on top and base's section follows under a sync comment.
//!
//! # Shell
//!
//! The rest of the crate is the file-system shell around the pure core:
//! [`MergeSettings`] (layered from settings files, `CONFMERGE__*` env vars and
//! CLI overrides), home-directory expansion, backups and the
//! preview/show/apply operations in [`handle`]. With the `clap` feature (on by
//! default) the [`MergeArgs`] adapter and the `confmerge` binary are built.
//!
//! # Error handling
//!
//! The core is total and returns plain values. Shell operations return
//! [`ConfmergeError`], whose messages name the file, role or key involved.

pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod file;
mod merge;
mod ops;
mod parser;
mod settings;
mod summary;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{MergeArgs, MergeCommand};
pub use error::ConfmergeError;
pub use file::{backup_file, expand_home, read_config, write_config};
pub use merge::{
    PRESERVED_PROXY_NAMES, SYNC_COMMENT, SYNCABLE_SECTIONS, is_syncable, merge_configs,
    merge_documents,
};
pub use ops::{MergeOutcome, Prepared, apply, handle, prepare};
pub use parser::{
    get_custom_entries, get_non_custom_entries, get_proxy_names, get_section, parse_config,
    serialize_config,
};
pub use settings::{MergeSettings, SettingsInput, load_settings, resolve_settings, settings_template};
pub use summary::{DiffSummary, generate_diff_summary};
pub use types::{
    Document, Entry, LineKind, MergeAction, MergeResult, Section, SectionChange, SyncPolicy,
};
