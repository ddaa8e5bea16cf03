use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::classifier::EventClassifier;
use crate::compiler::DependencyGraph;
use super::debouncer::{DEBOUNCE_MS, Debouncer, is_temp_file};
use crate::actor::messages::{EventKind, WatchEvent};
use crate::utils::path::normalize_path;

fn make_root() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path()).join("src");
    std::fs::create_dir_all(&root).unwrap();
    (temp, root)
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
}

#[test]
fn test_event_mapping_by_kind() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.js"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.js")], EventKind::Add);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/b.js")], EventKind::Change);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/c.js")], EventKind::Unlink);
}

#[test]
fn test_metadata_change_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], metadata_kind()));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/real.js"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    // Temp file event should NOT update last_event or add to changes
    debouncer.add_event(&make_event(vec!["/tmp/.app.js.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/app.js~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_is_temp_file() {
    assert!(is_temp_file(std::path::Path::new("/src/app.js.bak")));
    assert!(is_temp_file(std::path::Path::new("/src/.#app.js")));
    assert!(!is_temp_file(std::path::Path::new("/src/_util.js")));
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.js")], EventKind::Add);
}

#[test]
fn test_unlink_then_add_restores() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.js")], EventKind::Add);
}

#[test]
fn test_add_then_unlink_discards() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));

    assert!(debouncer.changes.is_empty(), "add+unlink should discard");
}

#[test]
fn test_change_then_unlink_upgrades() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/tmp/a.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.js"], remove_kind()));

    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.js")], EventKind::Unlink);
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new();
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new();
    debouncer.last_event = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(DEBOUNCE_MS - 10));
    assert!(dur <= Duration::from_millis(DEBOUNCE_MS));
}

#[test]
fn test_take_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new();
    debouncer.push(PathBuf::from("/tmp/a.js"), EventKind::Change);
    assert!(debouncer.take_if_ready().is_none());

    debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 1));
    let batch = debouncer.take_if_ready().unwrap();
    assert_eq!(batch.len(), 1);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_correct_by_existence() {
    let (_temp, root) = make_root();
    let present = root.join("present.js");
    std::fs::write(&present, "x").unwrap();

    let mut changes = FxHashMap::default();
    changes.insert(root.join("gone_added.js"), EventKind::Add);
    changes.insert(root.join("gone_changed.js"), EventKind::Change);
    changes.insert(present.clone(), EventKind::Unlink);

    EventClassifier::correct_by_existence(&mut changes);

    assert!(!changes.contains_key(&root.join("gone_added.js")));
    assert_eq!(changes[&root.join("gone_changed.js")], EventKind::Unlink);
    assert_eq!(changes[&present], EventKind::Change);
}

#[test]
fn test_filter_drops_dirs_hidden_and_outside() {
    let (temp, root) = make_root();
    std::fs::create_dir_all(root.join("lib")).unwrap();
    std::fs::create_dir_all(root.join(".cache")).unwrap();
    std::fs::write(root.join(".cache/a.js"), "x").unwrap();
    std::fs::write(root.join("app.js"), "x").unwrap();
    let outside = normalize_path(temp.path()).join("outside.js");
    std::fs::write(&outside, "x").unwrap();

    let mut changes = FxHashMap::default();
    changes.insert(root.join("lib"), EventKind::Add);
    changes.insert(root.join(".cache/a.js"), EventKind::Change);
    changes.insert(outside, EventKind::Change);
    changes.insert(root.join("app.js"), EventKind::Change);
    changes.insert(root.join("old.js"), EventKind::Unlink);

    EventClassifier::filter_actionable(&mut changes, &root);

    assert_eq!(changes.len(), 2);
    assert!(changes.contains_key(&root.join("app.js")));
    assert!(changes.contains_key(&root.join("old.js")));
}

#[test]
fn test_classify_orders_removals_first() {
    let (_temp, root) = make_root();
    std::fs::write(root.join("new.js"), "x").unwrap();
    std::fs::write(root.join("a.js"), "x").unwrap();

    let mut raw = FxHashMap::default();
    raw.insert(root.join("new.js"), EventKind::Add);
    raw.insert(root.join("a.js"), EventKind::Change);
    raw.insert(root.join("old.js"), EventKind::Unlink);

    let events = EventClassifier::classify(raw, &root, &DependencyGraph::new()).unwrap();

    assert_eq!(
        events,
        vec![
            WatchEvent::unlink(root.join("old.js")),
            WatchEvent::change(root.join("a.js")),
            WatchEvent::add(root.join("new.js")),
        ]
    );
}

#[test]
fn test_classify_empty_batch() {
    let (_temp, root) = make_root();
    let mut raw = FxHashMap::default();
    raw.insert(root.join("vanished.js"), EventKind::Add);
    assert!(EventClassifier::classify(raw, &root, &DependencyGraph::new()).is_none());
}

#[test]
fn test_removed_dir_expands_to_tracked_files() {
    let (_temp, root) = make_root();
    let mut tracked = DependencyGraph::new();
    tracked.record(&root.join("lib/a.js"), &[root.join("lib/_b.js")]);
    tracked.record(&root.join("app.js"), &[]);

    let mut raw = FxHashMap::default();
    raw.insert(root.join("lib"), EventKind::Change);

    let events = EventClassifier::classify(raw, &root, &tracked).unwrap();

    assert_eq!(
        events,
        vec![
            WatchEvent::unlink(root.join("lib/_b.js")),
            WatchEvent::unlink(root.join("lib/a.js")),
        ]
    );
}

#[test]
fn test_existing_dir_expands_to_untracked_files() {
    let (_temp, root) = make_root();
    std::fs::create_dir_all(root.join("views/.cache")).unwrap();
    std::fs::write(root.join("views/x.js"), "x").unwrap();
    std::fs::write(root.join("views/known.js"), "k").unwrap();
    std::fs::write(root.join("views/.cache/y.js"), "y").unwrap();
    let mut tracked = DependencyGraph::new();
    tracked.record(&root.join("views/known.js"), &[root.join("views/_gone.js")]);

    let mut raw = FxHashMap::default();
    raw.insert(root.join("views"), EventKind::Add);

    let events = EventClassifier::classify(raw, &root, &tracked).unwrap();

    assert_eq!(
        events,
        vec![
            WatchEvent::unlink(root.join("views/_gone.js")),
            WatchEvent::add(root.join("views/x.js")),
        ]
    );
}

#[test]
fn test_removed_file_is_kept_as_is() {
    let (_temp, root) = make_root();
    let mut tracked = DependencyGraph::new();
    tracked.record(&root.join("app.js"), &[]);

    let mut raw = FxHashMap::default();
    raw.insert(root.join("app.js"), EventKind::Unlink);

    let events = EventClassifier::classify(raw, &root, &tracked).unwrap();

    assert_eq!(events, vec![WatchEvent::unlink(root.join("app.js"))]);
}
