//! FileSystem Actor
//!
//! Watches one source root and sends debounced events to the BuildActor.
//! Implements the "Watcher-First" pattern: the watcher is attached in
//! [`FsActor::new`], so events raised during the initial rescan are buffered
//! instead of lost.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → Classifier (existence, directories, visibility) → BuildMsg
//!                                          ▲
//!                                   DependencyGraph (what is tracked)
//! ```

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{BuildMsg, WatchEvent};
use crate::compiler::SharedGraph;
use crate::utils::path::relative_display;

// Existence correction and filtering (raw changes -> WatchEvents).
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Source root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

pub(crate) use classifier::EventClassifier;
use debouncer::Debouncer;
use watch_roots::WatchRoot;

/// FileSystem Actor - watches one source root
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    root: WatchRoot,
    /// Graph of the target, consulted to expand directory events
    tracked: SharedGraph,
    build_tx: mpsc::Sender<BuildMsg>,
    debouncer: Debouncer,
}

impl FsActor {
    /// Create the watcher and attach it to `root` immediately.
    pub fn new(
        root: PathBuf,
        tracked: SharedGraph,
        build_tx: mpsc::Sender<BuildMsg>,
    ) -> notify::Result<Self> {
        // notify is callback based and sync
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut root = WatchRoot::new(root);
        root.attach(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            root,
            tracked,
            build_tx,
            debouncer: Debouncer::new(),
        })
    }

    /// Run the actor event loop until the BuildActor goes away.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut root,
            tracked,
            build_tx,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Ends once the watcher (and with it `notify_tx`) is dropped.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    // A root that vanished or came back reports no file events of its own.
                    if let Some(kind) = root.maintain(&mut watcher) {
                        debouncer.push(root.path().to_path_buf(), kind);
                    }
                    if process_changes(&mut debouncer, &root, &tracked, &build_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped: {}", root.path().display());
    }
}

/// Forward the ready batch, if any.
///
/// Returns `Err(())` if the BuildActor shut down.
async fn process_changes(
    debouncer: &mut Debouncer,
    root: &WatchRoot,
    tracked: &SharedGraph,
    build_tx: &mpsc::Sender<BuildMsg>,
) -> Result<(), ()> {
    if build_tx.is_closed() {
        return Err(());
    }

    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let events = {
        let tracked = tracked.read();
        EventClassifier::classify(raw_events, root.path(), &tracked)
    };
    let Some(events) = events else {
        return Ok(());
    };

    log_events(&events, root);
    build_tx
        .send(BuildMsg::Events(events))
        .await
        .map_err(|_| ())
}

fn log_events(events: &[WatchEvent], root: &WatchRoot) {
    for event in events {
        crate::debug!(
            "watch";
            "{}: {}",
            event.kind.label(),
            relative_display(&event.path, root.path())
        );
    }
}
