//! Actor Message Definitions
//!
//! ```text
//! FsActor --Events--> BuildActor --spawn_blocking--> Builder
//!    ▲                    ▲
//!    └──── Supervisor ────┘ (one pair per target)
//! ```

use std::path::{Path, PathBuf};

/// What happened to a file under the source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Change,
    Unlink,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
        }
    }
}

/// One debounced filesystem event with a normalized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Add, path)
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Change, path)
    }

    pub fn unlink(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Unlink, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Messages to BuildActor
#[derive(Debug)]
pub enum BuildMsg {
    /// Debounced batch, removals first
    Events(Vec<WatchEvent>),
    /// Rebuild every entry (initial build)
    Rescan,
    /// Stop: abort tasks, discard in-flight results
    Shutdown,
}
