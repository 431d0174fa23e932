// src/error.rs
//! Error taxonomy for the digest core.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    /// A rule or source configuration resource is missing, unreadable or malformed.
    #[error("config error at {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A record or config entry failed validation (blank title, source, name or url).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DigestError {
    pub fn config(path: &Path, reason: impl ToString) -> Self {
        Self::Config {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
