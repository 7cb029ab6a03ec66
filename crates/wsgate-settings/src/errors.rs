//! Settings error types.

use std::path::PathBuf;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON or does not match the schema.
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for settings results.
pub type Result<T> = std::result::Result<T, SettingsError>;
