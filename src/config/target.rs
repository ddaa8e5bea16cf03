//! `[[target]]` entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::compiler::{CompileOptions, DEFAULT_BROWSERS};
use crate::utils::path::resolve_path;

/// How a target reacts to filesystem events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Rebuild the changed entry or the dependents of a changed partial.
    #[default]
    Targeted,
    /// Rebuild every entry on any relevant change.
    Rescan,
}

/// A target as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTarget {
    pub src: PathBuf,
    pub out: PathBuf,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_minify")]
    pub minify: bool,
    #[serde(default = "default_browsers")]
    pub browsers: String,
}

fn default_minify() -> bool {
    true
}

fn default_browsers() -> String {
    DEFAULT_BROWSERS.to_string()
}

/// Identity of a running target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub src: PathBuf,
    pub out: PathBuf,
}

impl std::fmt::Display for TargetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.src.display(), self.out.display())
    }
}

/// A validated target with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub key: TargetKey,
    pub strategy: Strategy,
    pub options: CompileOptions,
}

impl TargetConfig {
    pub fn src(&self) -> &Path {
        &self.key.src
    }

    pub fn out(&self) -> &Path {
        &self.key.out
    }
}

impl RawTarget {
    /// Resolve paths against `root` and check the pair makes sense.
    pub fn validate(self, root: &Path) -> Result<TargetConfig, ConfigError> {
        if self.src.as_os_str().is_empty() {
            return Err(ConfigError::Validation("`src` is empty".into()));
        }
        if self.out.as_os_str().is_empty() {
            return Err(ConfigError::Validation("`out` is empty".into()));
        }

        let src = resolve_path(&self.src, root);
        let out = resolve_path(&self.out, root);

        if src == out {
            return Err(ConfigError::Validation(format!(
                "`src` and `out` are the same directory: {}",
                src.display()
            )));
        }
        // Artifacts written inside the source tree would be picked up as entries.
        if out.starts_with(&src) {
            return Err(ConfigError::Validation(format!(
                "`out` ({}) must not be inside `src` ({})",
                out.display(),
                src.display()
            )));
        }
        if self.browsers.trim().is_empty() {
            return Err(ConfigError::Validation("`browsers` is empty".into()));
        }

        Ok(TargetConfig {
            key: TargetKey { src, out },
            strategy: self.strategy,
            options: CompileOptions {
                minify: self.minify,
                browsers: self.browsers,
            },
        })
    }
}
