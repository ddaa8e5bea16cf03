use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::actor::messages::EventKind;
use crate::utils::path::normalize_path;

/// Quiet period before a batch is released.
pub(super) const DEBOUNCE_MS: u64 = 300;

/// Pure debouncer: only handles timing and event deduplication.
/// Knows nothing about source roots or entries.
pub(super) struct Debouncer {
    /// Path → EventKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, EventKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event, merging with what is already pending for each path.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind as Notify;

        let kind = match event.kind {
            Notify::Create(_) => EventKind::Add,
            Notify::Remove(_) => EventKind::Unlink,
            Notify::Modify(modify) => {
                // mtime/atime/chmod noise would rebuild on every touch
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                EventKind::Change
            }
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.push(normalize_path(path), kind);
        }
    }

    /// Merge one event into the pending batch.
    ///
    /// - Unlink then Add/Change → the new kind (file was restored)
    /// - Change then Unlink → Unlink
    /// - Add then Unlink → dropped (appeared and vanished)
    /// - anything else → first event wins
    pub(super) fn push(&mut self, path: PathBuf, kind: EventKind) {
        let Some(&existing) = self.changes.get(&path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(Instant::now());
            return;
        };

        match (existing, kind) {
            (EventKind::Unlink, EventKind::Add | EventKind::Change) => {
                crate::debug!("watch"; "restore unlink->{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            (EventKind::Change, EventKind::Unlink) => {
                crate::debug!("watch"; "upgrade change->unlink: {}", path.display());
                self.changes.insert(path, EventKind::Unlink);
            }
            (EventKind::Add, EventKind::Unlink) => {
                crate::debug!("watch"; "discard add+unlink: {}", path.display());
                self.changes.remove(&path);
            }
            _ => return,
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the pending batch once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, EventKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;
        (!changes.is_empty()).then_some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        last_event.elapsed() >= Duration::from_millis(DEBOUNCE_MS) && !self.changes.is_empty()
    }

    /// Precise sleep duration until the batch may be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
