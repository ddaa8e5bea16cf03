//! Build Actor - per-target orchestration
//!
//! Turns debounced events into builds:
//! - each event is routed by [`plan`] (pure)
//! - removals and compiles run on blocking threads, one task per entry; a
//!   newer request for an entry aborts the older task and supersedes its
//!   ticket, so a removal never deletes what a later build wrote
//! - a rescan builds every entry in parallel on one blocking thread

mod plan;


pub use plan::{Action, plan};

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::{BuildMsg, WatchEvent};
use crate::compiler::Builder;
use crate::config::Strategy;
use crate::core::SourceKind;

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    builder: Arc<Builder>,
    strategy: Strategy,
    /// In-flight compile per entry
    tasks: FxHashMap<PathBuf, JoinHandle<()>>,
    rescan: Option<JoinHandle<()>>,
}

impl BuildActor {
    pub fn new(rx: mpsc::Receiver<BuildMsg>, builder: Arc<Builder>, strategy: Strategy) -> Self {
        Self {
            rx,
            builder,
            strategy,
            tasks: FxHashMap::default(),
            rescan: None,
        }
    }

    /// Process messages in arrival order until shutdown or channel close.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            if !self.dispatch(msg) {
                break;
            }
        }
        self.shutdown();
    }

    /// Handle one message. Returns `false` when the actor should stop.
    fn dispatch(&mut self, msg: BuildMsg) -> bool {
        match msg {
            BuildMsg::Events(events) => self.on_events(events),
            BuildMsg::Rescan => self.spawn_rescan(),
            BuildMsg::Shutdown => return false,
        }
        self.tasks.retain(|_, task| !task.is_finished());
        true
    }

    fn on_events(&mut self, events: Vec<WatchEvent>) {
        let mut compiles = Vec::new();
        let mut queued = FxHashSet::default();
        let mut rescan = false;

        for event in &events {
            let class = self.builder.classify(&event.path);
            let actions = {
                let graph = self.builder.graph().read();
                plan(event, class, &graph, self.strategy)
            };
            crate::debug!(
                "watch";
                "{} {} → {} action(s)",
                event.kind.label(),
                self.builder.display(&event.path),
                actions.len()
            );

            for action in actions {
                match action {
                    Action::Remove(entry, kind) => {
                        queued.remove(&entry);
                        compiles.retain(|p| p != &entry);
                        self.remove(entry, kind);
                    }
                    Action::Compile(entry) => {
                        if queued.insert(entry.clone()) {
                            compiles.push(entry);
                        }
                    }
                    Action::Rescan => rescan = true,
                }
            }
        }

        if rescan {
            self.spawn_rescan();
            return;
        }
        for entry in compiles {
            self.spawn_compile(entry);
        }
    }

    /// Build `entry` on a blocking thread, superseding any earlier request.
    fn spawn_compile(&mut self, entry: PathBuf) {
        let ticket = self.builder.flights().begin(&entry);
        if let Some(previous) = self.tasks.remove(&entry) {
            previous.abort();
            crate::debug!("build"; "superseded: {}", self.builder.display(&entry));
        }

        let builder = Arc::clone(&self.builder);
        let key = entry.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = builder.build(&entry, &ticket);
            builder.report(&entry, &result);
        });
        self.tasks.insert(key, task);
    }

    fn spawn_rescan(&mut self) {
        if let Some(previous) = self.rescan.take() {
            previous.abort();
        }

        let builder = Arc::clone(&self.builder);
        self.rescan = Some(tokio::task::spawn_blocking(move || {
            let report = builder.rescan();
            for (entry, result) in &report.results {
                builder.report(entry, result);
            }
            crate::log!(
                "build";
                "{}: {} built, {} failed",
                builder.source_root().display(),
                report.built(),
                report.failed()
            );
        }));
    }

    /// Delete the artifact pair of `entry` on a blocking thread.
    fn remove(&mut self, entry: PathBuf, kind: SourceKind) {
        let ticket = self.builder.flights().begin(&entry);
        if let Some(task) = self.tasks.remove(&entry) {
            task.abort();
        }

        let builder = Arc::clone(&self.builder);
        let key = entry.clone();
        let task = tokio::task::spawn_blocking(move || {
            match builder.remove(&entry, kind, &ticket) {
                Ok(0) => {}
                Ok(_) => crate::log!("remove"; "{}", builder.display(&entry)),
                Err(e) => crate::log!("error"; "{}: {}", builder.display(&entry), e),
            }
        });
        self.tasks.insert(key, task);
    }

    /// Discard whatever is still in flight.
    fn shutdown(&mut self) {
        self.builder.close();
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
        if let Some(task) = self.rescan.take() {
            task.abort();
        }
        crate::debug!("build"; "stopped: {}", self.builder.source_root().display());
    }

    /// Wait for every spawned build to finish.
    #[cfg(test)]
    async fn settle(&mut self) {
        if let Some(task) = self.rescan.take() {
            let _ = task.await;
        }
        for (_, task) in self.tasks.drain() {
            let _ = task.await;
        }
    }
}
