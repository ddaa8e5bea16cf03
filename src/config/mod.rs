//! Watch configuration (`minikit.toml` or a JSON equivalent).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error     # ConfigError
//! ├── handle    # Hash-checked reload with arc-swap
//! ├── target    # [[target]] entries, Strategy, TargetKey
//! ├── util      # Config file lookup
//! └── mod.rs    # WatchConfig (this file)
//! ```
//!
//! # Layouts
//!
//! ```toml
//! [[target]]
//! src = "assets/src"
//! out = "assets/dist"
//! strategy = "targeted"   # or "rescan"
//! minify = true
//! browsers = "defaults"
//! ```
//!
//! A `.json` file holds the same data as `{ "target": [...] }`, or a bare
//! array of `{ "src": ..., "out": ... }` objects.
//!
//! One broken target never takes the others down: it is reported and skipped.

mod error;
mod handle;
mod target;
mod util;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use handle::{ConfigHandle, Reload};
pub use target::{RawTarget, Strategy, TargetConfig, TargetKey};
pub use util::locate;

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::log;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "minikit.toml";
/// Fallback of earlier releases: a bare JSON array of targets.
pub const LEGACY_CONFIG_NAME: &str = "minikit.config.json";

/// Key holding the target list in both TOML and JSON object layouts.
const TARGET_KEY: &str = "target";

/// On-disk syntax, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Problems that did not stop the config from loading.
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Unknown fields, as dotted paths.
    pub ignored: Vec<String>,
    /// Targets dropped, with their index and the reason.
    pub skipped: Vec<(usize, ConfigError)>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty() && self.skipped.is_empty()
    }

    /// Print warnings for everything collected.
    pub fn report(&self, path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());

        if !self.ignored.is_empty() {
            log!("config"; "unknown fields in {}, ignoring:", display_path);
            for field in &self.ignored {
                eprintln!("- {field}");
            }
        }
        for (index, error) in &self.skipped {
            log!("config"; "skipping target[{}]: {}", index, error_text(error));
        }
    }
}

fn error_text(error: &ConfigError) -> String {
    match error {
        ConfigError::Toml(e) => e.message().to_string(),
        ConfigError::Json(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// Parsed and validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Absolute path to the config file
    pub config_path: PathBuf,
    /// Directory relative target paths are resolved against
    pub root: PathBuf,
    pub targets: Vec<TargetConfig>,
}

impl WatchConfig {
    /// Read, parse and validate `path`, printing diagnostics.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_content(path, &content)
    }

    /// Parse already-read content of the file at `path`.
    pub fn from_content(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config_path = crate::utils::path::normalize_path(path);
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let (mut config, diagnostics) =
            Self::parse(content, ConfigFormat::from_path(path), &root)?;
        diagnostics.report(path);

        config.config_path = config_path;
        Ok(config)
    }

    /// Parse `content` without touching the filesystem or the terminal.
    ///
    /// Only a syntax error in the document itself fails; bad targets are
    /// collected in [`Diagnostics::skipped`].
    pub fn parse(
        content: &str,
        format: ConfigFormat,
        root: &Path,
    ) -> Result<(Self, Diagnostics), ConfigError> {
        let mut diagnostics = Diagnostics::default();

        let raw = match format {
            ConfigFormat::Toml => raw_targets_toml(content, &mut diagnostics)?,
            ConfigFormat::Json => raw_targets_json(content, &mut diagnostics)?,
        };

        let mut seen = FxHashSet::default();
        let mut targets = Vec::new();
        for (index, raw) in raw {
            let validated = raw.and_then(|raw| raw.validate(root));
            match validated {
                Ok(target) if !seen.insert(target.key.clone()) => {
                    diagnostics.skipped.push((
                        index,
                        ConfigError::Validation(format!("duplicate target {}", target.key)),
                    ));
                }
                Ok(target) => targets.push(target),
                Err(e) => diagnostics.skipped.push((index, e)),
            }
        }

        let config = Self {
            config_path: PathBuf::new(),
            root: root.to_path_buf(),
            targets,
        };
        Ok((config, diagnostics))
    }
}

type RawEntries = Vec<(usize, Result<RawTarget, ConfigError>)>;

fn raw_targets_toml(content: &str, diagnostics: &mut Diagnostics) -> Result<RawEntries, ConfigError> {
    let mut table: toml::Table = toml::from_str(content)?;

    let list = match table.remove(TARGET_KEY) {
        None => Vec::new(),
        Some(toml::Value::Array(list)) => list,
        Some(_) => {
            return Err(ConfigError::Validation(
                "`target` must be an array of tables ([[target]])".into(),
            ));
        }
    };
    diagnostics.ignored.extend(table.keys().cloned());

    Ok(list
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let target = deserialize_target(index, value, &mut diagnostics.ignored)
                .map_err(ConfigError::from);
            (index, target)
        })
        .collect())
}

fn raw_targets_json(content: &str, diagnostics: &mut Diagnostics) -> Result<RawEntries, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    let list = match value {
        serde_json::Value::Array(list) => list,
        serde_json::Value::Object(mut object) => {
            let list = match object.remove(TARGET_KEY) {
                None => Vec::new(),
                Some(serde_json::Value::Array(list)) => list,
                Some(_) => {
                    return Err(ConfigError::Validation("`target` must be an array".into()));
                }
            };
            diagnostics.ignored.extend(object.keys().cloned());
            list
        }
        _ => {
            return Err(ConfigError::Validation(
                "expected an object or an array of targets".into(),
            ));
        }
    };

    Ok(list
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let target = deserialize_target(index, value, &mut diagnostics.ignored)
                .map_err(ConfigError::from);
            (index, target)
        })
        .collect())
}

/// Deserialize one target, collecting unknown fields as `target[i].field`.
fn deserialize_target<'de, D>(
    index: usize,
    value: D,
    ignored: &mut Vec<String>,
) -> Result<RawTarget, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_ignored::deserialize(value, |path: serde_ignored::Path| {
        ignored.push(format!("{TARGET_KEY}[{index}].{path}"));
    })
}

