//! Dependency tracking for incremental builds.
//!
//! One graph per watch target, shared between the orchestrator and the
//! blocking build workers as [`SharedGraph`].

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Graph handle shared across tasks of one target.
pub type SharedGraph = Arc<RwLock<DependencyGraph>>;

/// Bidirectional dependency graph for incremental builds.
///
/// Maintains both forward (entry → inlined files) and reverse
/// (file → entries that inlined it) mappings.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Forward sets keep first-seen order and hold no duplicates
/// - Self-references are excluded
/// - Paths are normalized by callers before they get here
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Forward: entry → files it transitively inlined
    forward: FxHashMap<PathBuf, Vec<PathBuf>>,
    /// Reverse: inlined file → entries that use it
    reverse: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph handle for sharing across tasks.
    pub fn shared() -> SharedGraph {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Record the dependencies of an entry.
    ///
    /// Replaces any existing record for this entry.
    pub fn record(&mut self, entry: &Path, dependencies: &[PathBuf]) {
        self.remove(entry);

        let mut seen = FxHashSet::default();
        let deps: Vec<PathBuf> = dependencies
            .iter()
            .filter(|p| p.as_path() != entry)
            .filter(|p| seen.insert(p.to_path_buf()))
            .cloned()
            .collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(entry.to_path_buf());
        }

        self.forward.insert(entry.to_path_buf(), deps);
    }

    /// Record `dependencies` only if `entry` has no record yet.
    ///
    /// Used after a failed resolution: an earlier successful record wins.
    /// Returns whether anything was recorded.
    pub fn record_if_absent(&mut self, entry: &Path, dependencies: &[PathBuf]) -> bool {
        if self.forward.contains_key(entry) || dependencies.is_empty() {
            return false;
        }
        self.record(entry, dependencies);
        true
    }

    /// Entries whose recorded set contains `changed`, sorted.
    ///
    /// The resolver records transitive includes flat, so one lookup covers
    /// partials of partials.
    pub fn dependents(&self, changed: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = self
            .reverse
            .get(changed)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    /// Recorded dependencies of an entry.
    #[inline]
    pub fn uses(&self, entry: &Path) -> Option<&[PathBuf]> {
        self.forward.get(entry).map(Vec::as_slice)
    }

    /// Drop an entry and clean up its reverse mappings.
    ///
    /// Returns `false` if nothing was recorded for it.
    pub fn remove(&mut self, entry: &Path) -> bool {
        let Some(old_deps) = self.forward.remove(entry) else {
            return false;
        };

        for dep in old_deps {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(entry);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
        true
    }

    /// Whether `path` is a recorded entry or a dependency of one.
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.forward.contains_key(path) || self.reverse.contains_key(path)
    }

    /// Recorded entries and dependencies strictly below `dir`, sorted.
    pub fn tracked_under(&self, dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .forward
            .keys()
            .chain(self.reverse.keys())
            .filter(|p| p.as_path() != dir && p.starts_with(dir))
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Number of recorded entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Clear all mappings.
    #[inline]
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}
