//! Config with hash-checked reload.
//!
//! Uses `arc-swap` so the supervisor and status reporting can read the
//! current snapshot without locking while a reload replaces it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use super::{ConfigError, WatchConfig};

/// Hash value meaning "no file content seen".
const NO_HASH: u64 = 0;

/// Result of [`ConfigHandle::reload`].
#[derive(Debug)]
pub enum Reload {
    /// Content identical to the last load.
    Unchanged,
    /// New content parsed; this is the new snapshot.
    Changed(Arc<WatchConfig>),
    /// The file went away since the last load.
    Missing,
}

/// Current configuration plus the hash of the content it came from.
#[derive(Debug)]
pub struct ConfigHandle {
    path: PathBuf,
    current: ArcSwapOption<WatchConfig>,
    hash: AtomicU64,
}

impl ConfigHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: ArcSwapOption::empty(),
            hash: AtomicU64::new(NO_HASH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn current(&self) -> Option<Arc<WatchConfig>> {
        self.current.load_full()
    }

    /// Re-read the config file, parsing only if its content changed.
    ///
    /// A parse failure still records the new hash, so the same broken
    /// content is reported once; the previous snapshot stays current.
    pub fn reload(&self) -> Result<Reload, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let previous = self.hash.swap(NO_HASH, Ordering::Relaxed);
                self.current.store(None);
                return Ok(if previous == NO_HASH {
                    Reload::Unchanged
                } else {
                    Reload::Missing
                });
            }
            Err(e) => return Err(ConfigError::Io(self.path.clone(), e)),
        };

        let new_hash = content_hash(&content);
        if self.hash.swap(new_hash, Ordering::Relaxed) == new_hash {
            return Ok(Reload::Unchanged);
        }

        let config = Arc::new(WatchConfig::from_content(&self.path, &content)?);
        self.current.store(Some(Arc::clone(&config)));
        Ok(Reload::Changed(config))
    }
}

/// Content hash that never collides with [`NO_HASH`].
fn content_hash(content: &str) -> u64 {
    crate::utils::hash::compute(content.as_bytes()).max(1)
}
