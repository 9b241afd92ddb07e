//! File-system side of the merge: settings discovery, home expansion, reading
//! the two configs, backups and writing the result.
//!
//! Everything in here is a thin wrapper over `std::fs` that maps failures to
//! [`ConfmergeError`] with the offending path attached. The merge itself never
//! touches the disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfmergeError;
use crate::settings::APP_NAME;

/// Candidate settings files, lowest priority first: the platform config
/// directory (e.g. `~/.config/confmerge/` on Linux), then the working directory.
pub fn settings_search_paths() -> Vec<PathBuf> {
    let file_name = format!("{APP_NAME}.toml");
    let platform = directories::ProjectDirs::from("", "", APP_NAME)
        .map(|proj| proj.config_dir().to_path_buf());
    let cwd = std::env::current_dir().ok();

    platform
        .into_iter()
        .chain(cwd)
        .map(|dir| dir.join(&file_name))
        .collect()
}

/// Read every settings file that exists, in the given order.
///
/// Missing files are skipped; any other I/O error is returned.
pub fn load_settings_files(paths: &[PathBuf]) -> Result<Vec<(PathBuf, String)>, ConfmergeError> {
    let mut results = Vec::new();
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded settings file");
                results.push((path.clone(), content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ConfmergeError::IoError {
                    path: path.clone(),
                    source: e,
                });
            }
        }
    }
    Ok(results)
}

/// Replace a leading `~` with the user's home directory.
///
/// Only `~` on its own or followed by a path separator is expanded;
/// `~user/...` and every other path come back unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let home = directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    expand_home_with(path, home.as_deref())
}

fn expand_home_with(path: &str, home: Option<&Path>) -> PathBuf {
    let (Some(rest), Some(home)) = (path.strip_prefix('~'), home) else {
        return PathBuf::from(path);
    };
    match rest.chars().next() {
        None => home.to_path_buf(),
        Some(c) if std::path::is_separator(c) => home.join(&rest[c.len_utf8()..]),
        Some(_) => PathBuf::from(path),
    }
}

/// Read one of the two configs. `role` ("base" or "mod") names it in errors.
pub fn read_config(role: &'static str, path: &Path) -> Result<String, ConfmergeError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfmergeError::FileNotFound {
            role,
            path: path.to_path_buf(),
        },
        _ => ConfmergeError::IoError {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// `<path>.backup.<millis>`.
pub fn backup_path(path: &Path, millis: i64) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".backup.{millis}"));
    PathBuf::from(name)
}

/// Copy `path` next to itself with a millisecond timestamp suffix.
pub fn backup_file(path: &Path) -> Result<PathBuf, ConfmergeError> {
    let target = backup_path(path, chrono::Utc::now().timestamp_millis());
    std::fs::copy(path, &target).map_err(|e| ConfmergeError::IoError {
        path: target.clone(),
        source: e,
    })?;
    info!(from = %path.display(), to = %target.display(), "backed up mod config");
    Ok(target)
}

/// Overwrite `path` with `content`.
pub fn write_config(path: &Path, content: &str) -> Result<(), ConfmergeError> {
    std::fs::write(path, content).map_err(|e| ConfmergeError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), bytes = content.len(), "wrote merged config");
    Ok(())
}
