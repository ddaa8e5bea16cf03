//! Event → action routing.
//!
//! | kind   | visibility | event        | actions                       |
//! |--------|------------|--------------|-------------------------------|
//! | built  | Entry      | Add, Change  | compile the entry             |
//! | built  | Partial    | Add, Change  | compile every dependent       |
//! | built  | Entry      | Unlink       | remove artifacts + graph slot |
//! | built  | Partial    | Unlink       | compile every dependent       |
//! | Ignored| any        | any          | nothing                       |
//!
//! With [`Strategy::Rescan`] every compile becomes one full rescan.

use std::path::PathBuf;

use crate::actor::messages::{EventKind, WatchEvent};
use crate::compiler::DependencyGraph;
use crate::config::Strategy;
use crate::core::{Classification, SourceKind, Visibility};

/// One thing the build actor does in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Compile(PathBuf),
    Remove(PathBuf, SourceKind),
    Rescan,
}

/// Decide what `event` means for the target.
///
/// Pure: `graph` is only read and nothing touches the filesystem.
pub fn plan(
    event: &WatchEvent,
    class: Classification,
    graph: &DependencyGraph,
    strategy: Strategy,
) -> Vec<Action> {
    if class.is_ignored() {
        return Vec::new();
    }

    let targeted = match (class.visibility, event.kind) {
        (Visibility::Entry, EventKind::Unlink) => {
            vec![Action::Remove(event.path.clone(), class.kind)]
        }
        (Visibility::Entry, EventKind::Add | EventKind::Change) => {
            vec![Action::Compile(event.path.clone())]
        }
        (Visibility::Partial, _) => graph
            .dependents(&event.path)
            .into_iter()
            .map(Action::Compile)
            .collect(),
    };

    match strategy {
        Strategy::Targeted => targeted,
        Strategy::Rescan => {
            let mut actions: Vec<_> = targeted
                .into_iter()
                .filter(|a| matches!(a, Action::Remove(..)))
                .collect();
            actions.push(Action::Rescan);
            actions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify;
    use std::path::Path;

    const ROOT: &str = "/src";

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.record(
            Path::new("/src/app.js"),
            &[PathBuf::from("/src/_util.js")],
        );
        graph.record(
            Path::new("/src/admin.js"),
            &[PathBuf::from("/src/_util.js"), PathBuf::from("/src/_lib/x.js")],
        );
        graph
    }

    fn run(event: WatchEvent, strategy: Strategy) -> Vec<Action> {
        let class = classify(&event.path, Path::new(ROOT));
        plan(&event, class, &graph(), strategy)
    }

    #[test]
    fn test_entry_change_compiles_entry() {
        assert_eq!(
            run(WatchEvent::change("/src/app.js"), Strategy::Targeted),
            vec![Action::Compile(PathBuf::from("/src/app.js"))]
        );
        assert_eq!(
            run(WatchEvent::add("/src/new.scss"), Strategy::Targeted),
            vec![Action::Compile(PathBuf::from("/src/new.scss"))]
        );
    }

    #[test]
    fn test_partial_change_compiles_dependents_only() {
        assert_eq!(
            run(WatchEvent::change("/src/_util.js"), Strategy::Targeted),
            vec![
                Action::Compile(PathBuf::from("/src/admin.js")),
                Action::Compile(PathBuf::from("/src/app.js")),
            ]
        );
    }

    #[test]
    fn test_partial_segment_in_directory() {
        assert_eq!(
            run(WatchEvent::change("/src/_lib/x.js"), Strategy::Targeted),
            vec![Action::Compile(PathBuf::from("/src/admin.js"))]
        );
    }

    #[test]
    fn test_unknown_partial_does_nothing() {
        assert!(run(WatchEvent::add("/src/_fresh.js"), Strategy::Targeted).is_empty());
    }

    #[test]
    fn test_entry_unlink_removes() {
        assert_eq!(
            run(WatchEvent::unlink("/src/theme/main.scss"), Strategy::Targeted),
            vec![Action::Remove(
                PathBuf::from("/src/theme/main.scss"),
                SourceKind::Stylesheet
            )]
        );
    }

    #[test]
    fn test_partial_unlink_rebuilds_dependents() {
        assert_eq!(
            run(WatchEvent::unlink("/src/_util.js"), Strategy::Targeted).len(),
            2
        );
    }

    #[test]
    fn test_ignored_is_noop() {
        for strategy in [Strategy::Targeted, Strategy::Rescan] {
            assert!(run(WatchEvent::change("/src/readme.md"), strategy).is_empty());
            assert!(run(WatchEvent::change("/elsewhere/app.js"), strategy).is_empty());
        }
    }

    #[test]
    fn test_rescan_strategy() {
        assert_eq!(
            run(WatchEvent::change("/src/_util.js"), Strategy::Rescan),
            vec![Action::Rescan]
        );
        assert_eq!(
            run(WatchEvent::unlink("/src/app.js"), Strategy::Rescan),
            vec![
                Action::Remove(PathBuf::from("/src/app.js"), SourceKind::Script),
                Action::Rescan,
            ]
        );
    }
}
