//! Error types for wfsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while loading the settings document.
///
/// Every variant is fatal for a sync run.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file did not exist at the expected path.
    #[error("settings file '{path}' not found")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure other than a missing file.
    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error with file path and line context from serde_yaml.
    #[error("invalid YAML in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but holds nothing (empty file or comments only).
    #[error("settings file '{path}' is empty")]
    Empty { path: PathBuf },
}

/// A single override entry that cannot be turned into path/value pairs.
///
/// Never fatal: the entry is skipped with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    /// String form without a `:` separator.
    #[error("invalid update format (expected 'path: value'): {0}")]
    MissingSeparator(String),

    /// Path is empty or contains an empty segment (`a..b`).
    #[error("invalid key path '{0}'")]
    InvalidPath(String),

    /// Mapping form whose key is not a scalar.
    #[error("invalid update key: {0}")]
    InvalidKey(String),

    /// Neither a mapping nor a string.
    #[error("invalid update format: {0}")]
    UnsupportedShape(String),
}
