//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config file parsing error")]
    Json(#[from] serde_json::Error),

    #[error("Config validation error: {0}")]
    Validation(String),

    #[error("cannot watch config file")]
    Watch(#[from] notify::Error),
}
