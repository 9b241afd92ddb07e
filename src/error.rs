use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfmergeError {
    #[error("No {role} config path configured: set `{role}_config_path` or pass --{role}")]
    MissingPath { role: &'static str },

    #[error("{label} config file not found: {path}", label = capitalize(.role))]
    FileNotFound { role: &'static str, path: PathBuf },

    #[error("Failed to access {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in settings file")]
    UnknownKeys(Vec<ConfmergeError>),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Settings error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Merge cancelled")]
    Cancelled,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
