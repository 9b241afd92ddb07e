//! Settings for the merge shell: where the two files live and whether to back
//! up the mod file before overwriting it.
//!
//! Layers, lowest priority first:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Settings files        platform config dir, then the working directory
//!        ↑ overridden by
//! Environment vars      CONFMERGE__<KEY>
//!        ↑ overridden by
//! Overrides             --base / --mod / --no-backup
//! ```
//!
//! [`resolve_settings`] works on pre-loaded input and does no I/O, so the whole
//! pipeline is testable with synthetic files and environment.

use std::path::{Path, PathBuf};

use confique::Config;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::ConfmergeError;
use crate::file;

/// Used for the platform config directory and the settings file name.
pub const APP_NAME: &str = "confmerge";

/// Environment variables `CONFMERGE__<KEY>` override settings file values.
pub const ENV_PREFIX: &str = "CONFMERGE";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MergeSettings {
    /// Path to the upstream base configuration, e.g. the subscription file.
    /// A leading `~` expands to the home directory.
    pub base_config_path: Option<String>,

    /// Path to your modified configuration. The merged result is written here.
    pub mod_config_path: Option<String>,

    /// Copy the mod file to `<mod>.backup.<unix millis>` before writing.
    #[config(default = true)]
    pub backup_before_merge: bool,
}

/// All pre-loaded data needed to resolve settings. No I/O happens here.
pub struct SettingsInput {
    /// Settings file contents, lowest priority first.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// Whether `CONFMERGE__*` variables are applied.
    pub env_enabled: bool,
    /// Highest-priority `(key, value)` pairs.
    pub overrides: Vec<(String, Value)>,
    /// Whether unknown keys in settings files are an error.
    pub strict: bool,
}

/// Discover settings files, read the process environment, and resolve.
pub fn load_settings(
    overrides: Vec<(String, Value)>,
    env_enabled: bool,
) -> Result<MergeSettings, ConfmergeError> {
    let files = file::load_settings_files(&file::settings_search_paths())?;
    let env_vars = if env_enabled {
        std::env::vars().collect()
    } else {
        Vec::new()
    };
    resolve_settings(SettingsInput {
        files,
        env_vars,
        env_enabled,
        overrides,
        strict: true,
    })
}

/// Layer files, environment and overrides, then let confique fill defaults.
pub fn resolve_settings(input: SettingsInput) -> Result<MergeSettings, ConfmergeError> {
    let mut merged = Table::new();
    for (path, content) in &input.files {
        if input.strict {
            reject_unknown_keys(content, path)?;
        }
        let table: Table = toml::from_str(content).map_err(|e| ConfmergeError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        merged.extend(table);
    }

    if input.env_enabled {
        merged.extend(env_to_table(ENV_PREFIX, input.env_vars));
    }

    merged.extend(input.overrides);

    let layer: <MergeSettings as Config>::Layer =
        Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfmergeError::InvalidValue {
                key: "<settings>".into(),
                reason: e.to_string(),
            })?;

    MergeSettings::builder()
        .preloaded(layer)
        .load()
        .map_err(ConfmergeError::from)
}

/// Commented TOML template generated from the doc comments above.
pub fn settings_template() -> String {
    confique::toml::template::<MergeSettings>(confique::toml::FormatOptions::default())
}

/// Build a table from `{PREFIX}__KEY` variables. Keys are lowercased;
/// `true`/`false` become booleans, everything else stays a string.
fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    vars.into_iter()
        .filter_map(|(key, value)| {
            let key = key.strip_prefix(&needle)?.to_lowercase();
            (!key.is_empty()).then(|| (key, parse_env_value(value)))
        })
        .collect()
}

fn parse_env_value(s: String) -> Value {
    if s.eq_ignore_ascii_case("true") {
        Value::Boolean(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Boolean(false)
    } else {
        Value::String(s)
    }
}

/// Fail on keys `MergeSettings` does not know, reporting each with its line.
fn reject_unknown_keys(content: &str, path: &Path) -> Result<(), ConfmergeError> {
    let mut unknown: Vec<String> = Vec::new();

    let deserializer = toml::Deserializer::new(content);
    let _layer: <MergeSettings as Config>::Layer =
        serde_ignored::deserialize(deserializer, |ignored| unknown.push(ignored.to_string()))
            .map_err(|e| ConfmergeError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            ConfmergeError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();
    Err(ConfmergeError::UnknownKeys(errors))
}

/// 1-indexed line of a top-level `key = ...`, or 0 when it cannot be found.
fn find_key_line(content: &str, key: &str) -> usize {
    content
        .lines()
        .position(|line| {
            line.trim_start()
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::SETTINGS_TOML;

    fn empty_input() -> SettingsInput {
        SettingsInput {
            files: vec![],
            env_vars: vec![],
            env_enabled: true,
            overrides: vec![],
            strict: true,
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_only() {
        let settings = resolve_settings(empty_input()).unwrap();
        assert_eq!(settings.base_config_path, None);
        assert_eq!(settings.mod_config_path, None);
        assert!(settings.backup_before_merge);
    }

    #[test]
    fn file_sets_every_key() {
        let input = SettingsInput {
            files: vec![("confmerge.toml".into(), SETTINGS_TOML.into())],
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.base_config_path.as_deref(), Some("~/Surge/Base.conf"));
        assert_eq!(settings.mod_config_path.as_deref(), Some("~/Surge/Mod.conf"));
        assert!(!settings.backup_before_merge);
    }

    #[test]
    fn later_file_overrides_earlier() {
        let input = SettingsInput {
            files: vec![
                ("global.toml".into(), SETTINGS_TOML.into()),
                ("local.toml".into(), "mod_config_path = \"./Mod.conf\"\n".into()),
            ],
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.base_config_path.as_deref(), Some("~/Surge/Base.conf"));
        assert_eq!(settings.mod_config_path.as_deref(), Some("./Mod.conf"));
    }

    #[test]
    fn env_overrides_file() {
        let input = SettingsInput {
            files: vec![("confmerge.toml".into(), SETTINGS_TOML.into())],
            env_vars: vars(&[
                ("CONFMERGE__BACKUP_BEFORE_MERGE", "TRUE"),
                ("CONFMERGE__BASE_CONFIG_PATH", "/srv/base.conf"),
                ("OTHER__MOD_CONFIG_PATH", "/ignored"),
            ]),
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert!(settings.backup_before_merge);
        assert_eq!(settings.base_config_path.as_deref(), Some("/srv/base.conf"));
        assert_eq!(settings.mod_config_path.as_deref(), Some("~/Surge/Mod.conf"));
    }

    #[test]
    fn env_disabled_is_ignored() {
        let input = SettingsInput {
            env_vars: vars(&[("CONFMERGE__BASE_CONFIG_PATH", "/srv/base.conf")]),
            env_enabled: false,
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.base_config_path, None);
    }

    #[test]
    fn numeric_looking_env_value_stays_a_path() {
        let table = env_to_table("CONFMERGE", vars(&[("CONFMERGE__BASE_CONFIG_PATH", "2024")]));
        assert_eq!(table["base_config_path"].as_str(), Some("2024"));
    }

    #[test]
    fn bare_prefix_ignored() {
        let table = env_to_table("CONFMERGE", vars(&[("CONFMERGE__", "x"), ("CONFMERGE", "y")]));
        assert!(table.is_empty());
    }

    #[test]
    fn overrides_win_over_everything() {
        let input = SettingsInput {
            files: vec![("confmerge.toml".into(), SETTINGS_TOML.into())],
            env_vars: vars(&[("CONFMERGE__MOD_CONFIG_PATH", "/env/mod.conf")]),
            overrides: vec![
                ("mod_config_path".into(), Value::String("/cli/mod.conf".into())),
                ("backup_before_merge".into(), Value::Boolean(true)),
            ],
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.mod_config_path.as_deref(), Some("/cli/mod.conf"));
        assert!(settings.backup_before_merge);
    }

    #[test]
    fn strict_rejects_unknown_key_with_line() {
        let input = SettingsInput {
            files: vec![(
                "confmerge.toml".into(),
                "backup_before_merge = true\nbase_path = \"x\"\n".into(),
            )],
            ..empty_input()
        };
        let err = resolve_settings(input).unwrap_err();
        let ConfmergeError::UnknownKeys(errors) = err else {
            panic!("expected UnknownKeys, got {err:?}");
        };
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfmergeError::UnknownKey { key, line: 2, .. } if key == "base_path"
        ));
    }

    #[test]
    fn lenient_allows_unknown_key() {
        let input = SettingsInput {
            files: vec![(
                "confmerge.toml".into(),
                "theme = \"dark\"\nbackup_before_merge = false\n".into(),
            )],
            strict: false,
            ..empty_input()
        };
        let settings = resolve_settings(input).unwrap();
        assert!(!settings.backup_before_merge);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let input = SettingsInput {
            files: vec![("broken.toml".into(), "base_config_path = ".into())],
            ..empty_input()
        };
        assert!(matches!(
            resolve_settings(input),
            Err(ConfmergeError::ParseError { .. })
        ));
    }

    #[test]
    fn wrong_type_is_invalid_value() {
        let input = SettingsInput {
            files: vec![("confmerge.toml".into(), "backup_before_merge = \"yes\"\n".into())],
            strict: false,
            ..empty_input()
        };
        assert!(matches!(
            resolve_settings(input),
            Err(ConfmergeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn template_documents_every_key() {
        let template = settings_template();
        assert!(template.contains("base_config_path"));
        assert!(template.contains("mod_config_path"));
        assert!(template.contains("backup_before_merge"));
        assert!(template.contains("home directory"));
    }

    #[test]
    fn key_line_lookup() {
        let content = "# header\nbase_config_path = \"a\"\n  mod_config_path=\"b\"\n";
        assert_eq!(find_key_line(content, "base_config_path"), 2);
        assert_eq!(find_key_line(content, "mod_config_path"), 3);
        assert_eq!(find_key_line(content, "missing"), 0);
    }
}
