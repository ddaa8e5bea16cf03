//! Configuration utility functions.

use std::path::{Path, PathBuf};

use super::{DEFAULT_CONFIG_NAME, LEGACY_CONFIG_NAME};

/// Find the config file by searching upward from the current directory
///
/// An explicit `--config` name is looked up as given. Without one,
/// `minikit.toml` is searched first, then the legacy `minikit.config.json`.
/// When nothing is found the path points at the would-be `minikit.toml`
/// in the current directory, so the watcher can wait for it.
///
/// # Example
/// ```text
/// /home/user/site/assets/src/  ← cwd
/// /home/user/site/minikit.toml ← found!
/// ```
pub fn locate(config: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_default();
    locate_from(&cwd, config)
}

/// [`locate`] starting at `start`.
pub(super) fn locate_from(start: &Path, config: Option<&Path>) -> PathBuf {
    match config {
        Some(config) => find_config_from(start, config).unwrap_or_else(|| start.join(config)),
        None => [DEFAULT_CONFIG_NAME, LEGACY_CONFIG_NAME]
            .into_iter()
            .find_map(|name| find_config_from(start, Path::new(name)))
            .unwrap_or_else(|| start.join(DEFAULT_CONFIG_NAME)),
    }
}

/// Upward search starting at `start`.
pub(super) fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
