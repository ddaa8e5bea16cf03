use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::actor::messages::EventKind;

/// Keeps the recursive watch on a source root attached.
///
/// A root that is deleted and recreated loses its watch; `maintain`
/// re-attaches it on the next tick and reports the transition as an event
/// for the root itself.
pub(super) struct WatchRoot {
    path: PathBuf,
    attached: bool,
}

impl WatchRoot {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            attached: false,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Attach now if the root exists. A missing root is picked up later.
    pub(super) fn attach(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        if self.path.exists() {
            watcher.watch(&self.path, RecursiveMode::Recursive)?;
            self.attached = true;
        }
        Ok(())
    }

    /// Unlink when the root vanished, Add when it was re-attached.
    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) -> Option<EventKind> {
        if self.attached && !self.path.exists() {
            // Stale handle, the inode it pointed at is gone.
            let _ = watcher.unwatch(&self.path);
            self.attached = false;
            crate::debug!("watch"; "root disappeared: {}", self.path.display());
            return Some(EventKind::Unlink);
        }

        if self.attached || !self.path.exists() {
            return None;
        }

        if watcher.watch(&self.path, RecursiveMode::Recursive).is_ok() {
            self.attached = true;
            crate::debug!("watch"; "re-attached watch: {}", self.path.display());
            return Some(EventKind::Add);
        }
        None
    }
}
