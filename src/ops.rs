//! Merge operations on real files: preview, show, apply and template.
//!
//! [`prepare`] reads and merges without writing anything; [`apply`] performs
//! the optional backup and the write. [`handle`] maps a [`MergeAction`] onto
//! them and returns a [`MergeOutcome`] for display.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfmergeError;
use crate::file;
use crate::merge::merge_configs;
use crate::parser::parse_config;
use crate::settings::{self, MergeSettings};
use crate::summary::generate_diff_summary;
use crate::types::{MergeAction, MergeResult};

/// Result of an operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Which files were merged and the per-section summary.
    Preview {
        base: PathBuf,
        target: PathBuf,
        summary: String,
    },
    /// The full merged configuration.
    Output(String),
    /// The mod file was overwritten, possibly after a backup.
    Applied {
        path: PathBuf,
        backup: Option<PathBuf>,
        summary: String,
    },
    /// A commented settings template.
    Template(String),
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOutcome::Preview {
                base,
                target,
                summary,
            } => {
                writeln!(f, "Base:   {}", display_name(base))?;
                writeln!(f, "Target: {}", display_name(target))?;
                writeln!(f)?;
                writeln!(f, "{summary}")
            }
            MergeOutcome::Output(text) => write!(f, "{text}"),
            MergeOutcome::Applied {
                path,
                backup,
                summary,
            } => {
                writeln!(f, "{summary}")?;
                writeln!(f)?;
                if let Some(backup) = backup {
                    writeln!(f, "Backup created: {}", backup.display())?;
                }
                writeln!(f, "Merged config written to {}", path.display())
            }
            MergeOutcome::Template(t) => write!(f, "{t}"),
        }
    }
}

/// Both files read and merged in memory.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub base_path: PathBuf,
    pub mod_path: PathBuf,
    pub result: MergeResult,
}

impl Prepared {
    pub fn summary(&self) -> String {
        generate_diff_summary(&self.result.changes)
    }
}

/// Resolve both paths, read both files and merge them. Writes nothing.
pub fn prepare(settings: &MergeSettings) -> Result<Prepared, ConfmergeError> {
    let base_path = required_path(settings.base_config_path.as_deref(), "base")?;
    let mod_path = required_path(settings.mod_config_path.as_deref(), "mod")?;

    let base_text = file::read_config("base", &base_path)?;
    let mod_text = file::read_config("mod", &mod_path)?;
    debug!(
        base_config = %base_path.display(),
        mod_config = %mod_path.display(),
        "merging configs"
    );

    let result = merge_configs(&parse_config(&base_text), &parse_config(&mod_text));
    Ok(Prepared {
        base_path,
        mod_path,
        result,
    })
}

/// Back up the mod file if asked to, then overwrite it with the merge output.
pub fn apply(prepared: &Prepared, backup: bool) -> Result<MergeOutcome, ConfmergeError> {
    let backup = if backup {
        Some(file::backup_file(&prepared.mod_path)?)
    } else {
        None
    };
    file::write_config(&prepared.mod_path, &prepared.result.output)?;
    Ok(MergeOutcome::Applied {
        path: prepared.mod_path.clone(),
        backup,
        summary: prepared.summary(),
    })
}

/// Run `action`. Settings are loaded only when the action needs them, and
/// `confirm` is asked before anything is written.
pub fn handle<L, C>(
    action: &MergeAction,
    load_settings: L,
    confirm: C,
) -> Result<MergeOutcome, ConfmergeError>
where
    L: FnOnce() -> Result<MergeSettings, ConfmergeError>,
    C: FnOnce(&Prepared) -> bool,
{
    match action {
        MergeAction::Template => Ok(MergeOutcome::Template(settings::settings_template())),
        MergeAction::Preview => {
            let prepared = prepare(&load_settings()?)?;
            Ok(MergeOutcome::Preview {
                summary: prepared.summary(),
                base: prepared.base_path,
                target: prepared.mod_path,
            })
        }
        MergeAction::Show => {
            let prepared = prepare(&load_settings()?)?;
            Ok(MergeOutcome::Output(prepared.result.output))
        }
        MergeAction::Apply { assume_yes } => {
            let settings = load_settings()?;
            let prepared = prepare(&settings)?;
            if !assume_yes && !confirm(&prepared) {
                info!(path = %prepared.mod_path.display(), "merge cancelled");
                return Err(ConfmergeError::Cancelled);
            }
            apply(&prepared, settings.backup_before_merge)
        }
    }
}

fn required_path(raw: Option<&str>, role: &'static str) -> Result<PathBuf, ConfmergeError> {
    match raw.map(str::trim) {
        Some(p) if !p.is_empty() => Ok(file::expand_home(p)),
        _ => Err(ConfmergeError::MissingPath { role }),
    }
}

/// File name for display, falling back to the whole path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{BASE_CONFIG, MOD_CONFIG};
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
        base: PathBuf,
        target: PathBuf,
    }

    fn workspace() -> Workspace {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("Base.conf");
        let target = dir.path().join("Mod.conf");
        fs::write(&base, BASE_CONFIG).unwrap();
        fs::write(&target, MOD_CONFIG).unwrap();
        Workspace { dir, base, target }
    }

    fn settings_for(ws: &Workspace, backup: bool) -> MergeSettings {
        MergeSettings {
            base_config_path: Some(ws.base.to_string_lossy().into_owned()),
            mod_config_path: Some(ws.target.to_string_lossy().into_owned()),
            backup_before_merge: backup,
        }
    }

    fn backups(ws: &Workspace) -> Vec<PathBuf> {
        fs::read_dir(ws.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".backup."))
            .collect()
    }

    #[test]
    fn prepare_merges_without_writing() {
        let ws = workspace();
        let prepared = prepare(&settings_for(&ws, true)).unwrap();
        assert!(prepared.result.success);
        assert!(prepared.result.output.contains("JP 01 = trojan"));
        assert_eq!(fs::read_to_string(&ws.target).unwrap(), MOD_CONFIG);
        assert!(backups(&ws).is_empty());
    }

    #[test]
    fn missing_base_path_setting() {
        let ws = workspace();
        let settings = MergeSettings {
            base_config_path: Some("   ".into()),
            ..settings_for(&ws, false)
        };
        assert!(matches!(
            prepare(&settings),
            Err(ConfmergeError::MissingPath { role: "base" })
        ));
    }

    #[test]
    fn missing_mod_file() {
        let ws = workspace();
        fs::remove_file(&ws.target).unwrap();
        assert!(matches!(
            prepare(&settings_for(&ws, false)),
            Err(ConfmergeError::FileNotFound { role: "mod", .. })
        ));
    }

    #[test]
    fn preview_reports_paths_and_summary() {
        let ws = workspace();
        let outcome = handle(
            &MergeAction::Preview,
            || Ok(settings_for(&ws, true)),
            |_| panic!("preview must not ask for confirmation"),
        )
        .unwrap();
        let text = outcome.to_string();
        assert!(text.contains("Base.conf"));
        assert!(text.contains("Mod.conf"));
        assert!(text.contains("Total: +7 / -1"));
    }

    #[test]
    fn show_returns_merged_output() {
        let ws = workspace();
        let outcome = handle(&MergeAction::Show, || Ok(settings_for(&ws, true)), |_| true).unwrap();
        let MergeOutcome::Output(text) = outcome else {
            panic!("expected Output");
        };
        assert!(text.starts_with("#!MANAGED-CONFIG https://mod.example.com/sub"));
    }

    #[test]
    fn apply_with_backup_writes_and_copies() {
        let ws = workspace();
        let outcome = handle(
            &MergeAction::Apply { assume_yes: false },
            || Ok(settings_for(&ws, true)),
            |prepared| prepared.result.changes.len() == 6,
        )
        .unwrap();

        let written = fs::read_to_string(&ws.target).unwrap();
        assert_ne!(written, MOD_CONFIG);
        assert!(written.contains("Streaming = select"));

        let copies = backups(&ws);
        assert_eq!(copies.len(), 1);
        assert_eq!(fs::read_to_string(&copies[0]).unwrap(), MOD_CONFIG);
        assert!(outcome.to_string().contains("Backup created"));
    }

    #[test]
    fn apply_without_backup_only_writes() {
        let ws = workspace();
        let outcome = handle(
            &MergeAction::Apply { assume_yes: true },
            || Ok(settings_for(&ws, false)),
            |_| panic!("--yes must skip confirmation"),
        )
        .unwrap();
        assert!(backups(&ws).is_empty());
        assert!(matches!(outcome, MergeOutcome::Applied { backup: None, .. }));
    }

    #[test]
    fn declined_apply_leaves_files_alone() {
        let ws = workspace();
        let result = handle(
            &MergeAction::Apply { assume_yes: false },
            || Ok(settings_for(&ws, true)),
            |_| false,
        );
        assert!(matches!(result, Err(ConfmergeError::Cancelled)));
        assert_eq!(fs::read_to_string(&ws.target).unwrap(), MOD_CONFIG);
        assert!(backups(&ws).is_empty());
    }

    #[test]
    fn template_does_not_load_settings() {
        let outcome = handle(
            &MergeAction::Template,
            || panic!("template must not load settings"),
            |_| true,
        )
        .unwrap();
        assert!(outcome.to_string().contains("mod_config_path"));
    }

    #[test]
    fn display_name_is_file_name() {
        assert_eq!(display_name(Path::new("/a/b/Mod.conf")), "Mod.conf");
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
