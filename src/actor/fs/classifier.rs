use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::actor::messages::{EventKind, WatchEvent};
use crate::compiler::DependencyGraph;
use crate::utils::path::normalize_path;

/// Turns a raw debounced batch into the events the build actor acts on.
///
/// Pipeline: correct_by_existence → recover_from_dir_events →
/// filter_actionable → ordered
///
/// `tracked` is the target's dependency graph: every entry and include it
/// knows about.
pub(crate) struct EventClassifier;

impl EventClassifier {
    pub(crate) fn classify(
        raw: FxHashMap<PathBuf, EventKind>,
        root: &Path,
        tracked: &DependencyGraph,
    ) -> Option<Vec<WatchEvent>> {
        let mut changes = raw;

        Self::correct_by_existence(&mut changes);
        Self::recover_from_dir_events(&mut changes, tracked);
        Self::filter_actionable(&mut changes, root);

        if changes.is_empty() {
            return None;
        }
        Some(Self::ordered(changes))
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Add for a file that's already
    /// been deleted, or Unlink for a file that still exists after an atomic save).
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, EventKind>) {
        let paths: Vec<_> = changes.keys().cloned().collect();
        for path in paths {
            let kind = changes[&path];
            let exists = path.exists();
            match kind {
                EventKind::Add if !exists => {
                    crate::debug!("watch"; "discard add (gone): {}", path.display());
                    changes.remove(&path);
                }
                EventKind::Change if !exists => {
                    crate::debug!("watch"; "upgrade change->unlink: {}", path.display());
                    changes.insert(path, EventKind::Unlink);
                }
                EventKind::Unlink if exists => {
                    crate::debug!("watch"; "downgrade unlink->change: {}", path.display());
                    changes.insert(path, EventKind::Change);
                }
                _ => {}
            }
        }
    }

    /// Recover file-level events from directory-level events.
    ///
    /// Renaming or moving a directory only reports the directory paths, and
    /// kqueue/FSEvents may report nothing but a directory Modify. So:
    /// - a removed directory → Unlink for every tracked file below it
    /// - an existing directory → Unlink for tracked files below it that are
    ///   gone, Add for untracked files below it
    pub(super) fn recover_from_dir_events(
        changes: &mut FxHashMap<PathBuf, EventKind>,
        tracked: &DependencyGraph,
    ) {
        // A removed path may have been a file or a directory; only tracked
        // children tell.
        let dirs: Vec<(PathBuf, EventKind)> = changes
            .iter()
            .filter(|(path, kind)| **kind == EventKind::Unlink || path.is_dir())
            .map(|(path, kind)| (path.clone(), *kind))
            .collect();

        for (dir, kind) in dirs {
            let found = Self::detect_disappeared(tracked, &dir, changes);
            if kind == EventKind::Unlink {
                if found > 0 {
                    changes.remove(&dir);
                }
            } else {
                Self::detect_appeared(tracked, &dir, changes);
            }
        }
    }

    /// Tracked files below `dir` that no longer exist. Returns how many.
    fn detect_disappeared(
        tracked: &DependencyGraph,
        dir: &Path,
        changes: &mut FxHashMap<PathBuf, EventKind>,
    ) -> usize {
        let mut found = 0;
        for path in tracked.tracked_under(dir) {
            if !path.exists() && !changes.contains_key(&path) {
                crate::debug!("watch"; "dir-scan found missing: {}", path.display());
                changes.insert(path, EventKind::Unlink);
                found += 1;
            }
        }
        found
    }

    /// Files below `dir` the graph does not know yet.
    fn detect_appeared(
        tracked: &DependencyGraph,
        dir: &Path,
        changes: &mut FxHashMap<PathBuf, EventKind>,
    ) {
        let files = jwalk::WalkDir::new(dir)
            .skip_hidden(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| normalize_path(&entry.path()));

        for path in files {
            if !tracked.is_tracked(&path) && !changes.contains_key(&path) {
                crate::debug!("watch"; "dir-scan found untracked: {}", path.display());
                changes.insert(path, EventKind::Add);
            }
        }
    }

    /// Keep events for files under `root` without a hidden segment.
    ///
    /// - Add/Change: must be a file (not a directory)
    /// - Unlink: the path is gone, so only the location is checked
    pub(super) fn filter_actionable(changes: &mut FxHashMap<PathBuf, EventKind>, root: &Path) {
        changes.retain(|path, kind| {
            if !is_visible_under(path, root) {
                return false;
            }
            match kind {
                EventKind::Add | EventKind::Change => path.is_file(),
                EventKind::Unlink => true,
            }
        });
    }

    /// Removals first so a rename cleans up before the new name builds,
    /// then by path for a stable order.
    fn ordered(changes: FxHashMap<PathBuf, EventKind>) -> Vec<WatchEvent> {
        let mut events: Vec<_> = changes
            .into_iter()
            .map(|(path, kind)| WatchEvent::new(kind, path))
            .collect();
        events.sort_by(|a, b| {
            let rank = |e: &WatchEvent| e.kind != EventKind::Unlink;
            rank(a).cmp(&rank(b)).then_with(|| a.path.cmp(&b.path))
        });
        events
    }
}

fn is_visible_under(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().all(|c| match c {
        Component::Normal(segment) => !segment.to_string_lossy().starts_with('.'),
        _ => false,
    }) && relative.components().next().is_some()
}
