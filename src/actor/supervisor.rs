//! Supervisor - one actor pair per configured target
//!
//! ```text
//!              ┌─ FsActor(src₁) ──► BuildActor(src₁ → out₁)
//! Supervisor ──┼─ FsActor(src₂) ──► BuildActor(src₂ → out₂)
//!    ▲         └─ ...
//!    └── config watcher (reload → stop all → respawn)
//! ```
//!
//! Reconfiguration is all-or-nothing: any change of config content stops
//! every target before the new set is spawned. A target that fails to
//! start is logged and skipped; the others keep running.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::Receiver;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::BuildMsg;
use crate::compiler::{Builder, Toolchain};
use crate::config::{ConfigHandle, Reload, TargetConfig, TargetKey, WatchConfig};

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;
/// How often the shutdown signal is polled
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);
/// Editors often write the config in several steps
const CONFIG_SETTLE: Duration = Duration::from_millis(100);
/// Grace period for a BuildActor to stop
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Actor pair of one live target.
struct RunningTarget {
    builder: Arc<Builder>,
    build_tx: mpsc::Sender<BuildMsg>,
    fs: JoinHandle<()>,
    build: JoinHandle<()>,
}

pub struct Supervisor {
    config: ConfigHandle,
    targets: BTreeMap<TargetKey, RunningTarget>,
}

impl Supervisor {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config: ConfigHandle::new(config_path),
            targets: BTreeMap::new(),
        }
    }

    /// Load the config, start every target and supervise until shutdown.
    ///
    /// Only a missing or broken config at startup is an error.
    pub async fn run(mut self, shutdown_rx: Receiver<()>) -> Result<()> {
        let config = match self.config.reload()? {
            Reload::Changed(config) => config,
            Reload::Unchanged | Reload::Missing => {
                return Err(anyhow!(
                    "config file not found: {}",
                    self.config.path().display()
                ));
            }
        };

        // Attach before the first spawn so no edit in between is missed.
        let (_watcher, mut config_rx) = watch_config(self.config.path())?;
        self.spawn_all(&config).await;
        crate::log!("watch"; "watching {} target(s), press Ctrl+C to stop", self.targets.len());

        loop {
            tokio::select! {
                biased;
                Some(()) = config_rx.recv() => {
                    tokio::time::sleep(CONFIG_SETTLE).await;
                    while config_rx.try_recv().is_ok() {}
                    self.on_config_event().await;
                }
                _ = tokio::time::sleep(SHUTDOWN_POLL) => {
                    if shutdown_rx.try_recv().is_ok() || crate::core::is_shutdown() {
                        crate::debug!("watch"; "shutdown signal received");
                        break;
                    }
                }
            }
        }

        self.stop_all().await;
        Ok(())
    }

    async fn on_config_event(&mut self) {
        match self.config.reload() {
            Ok(Reload::Unchanged) => {}
            Ok(Reload::Changed(config)) => {
                crate::log!("config"; "changed, restarting targets");
                self.stop_all().await;
                self.spawn_all(&config).await;
            }
            Ok(Reload::Missing) => {
                crate::log!(
                    "config";
                    "{} removed, targets stopped until it returns",
                    self.config.path().display()
                );
                self.stop_all().await;
            }
            Err(e) => {
                crate::log!("config"; "{}; keeping {} running target(s)", e, self.targets.len());
            }
        }
    }

    async fn spawn_all(&mut self, config: &WatchConfig) {
        if config.targets.is_empty() {
            crate::log!("config"; "no targets configured");
        }
        for target in &config.targets {
            match spawn_target(target).await {
                Ok(running) => {
                    crate::debug!("target"; "started {}", target.key);
                    self.targets.insert(target.key.clone(), running);
                }
                Err(e) => crate::log!("target"; "skipping {}: {:#}", target.key, e),
            }
        }
    }

    /// Cancel all: discard in-flight builds and stop every actor pair.
    async fn stop_all(&mut self) {
        for (key, target) in std::mem::take(&mut self.targets) {
            stop_target(target).await;
            crate::debug!("target"; "stopped {}", key);
        }
    }
}

/// Watcher first, then the initial rescan.
async fn spawn_target(target: &TargetConfig) -> Result<RunningTarget> {
    let toolchain = Toolchain::from_options(&target.options)?;
    let builder = Arc::new(Builder::new(target.src(), target.out(), toolchain));
    if !builder.source_root().is_dir() {
        crate::log!(
            "target";
            "{} does not exist yet, waiting for it",
            builder.source_root().display()
        );
    }

    let (build_tx, build_rx) = mpsc::channel(CHANNEL_BUFFER);
    let fs_actor = FsActor::new(
        builder.source_root().to_path_buf(),
        Arc::clone(builder.graph()),
        build_tx.clone(),
    )
    .with_context(|| format!("failed to watch {}", target.src().display()))?;
    let build_actor = BuildActor::new(build_rx, Arc::clone(&builder), target.strategy);

    let fs = tokio::spawn(fs_actor.run());
    let build = tokio::spawn(build_actor.run());
    build_tx
        .send(BuildMsg::Rescan)
        .await
        .map_err(|_| anyhow!("build actor exited before the initial rescan"))?;

    Ok(RunningTarget {
        builder,
        build_tx,
        fs,
        build,
    })
}

async fn stop_target(target: RunningTarget) {
    // Closed flights first: nothing in flight may write after this point.
    target.builder.close();
    target.fs.abort();
    let _ = target.build_tx.send(BuildMsg::Shutdown).await;

    let mut build = target.build;
    if tokio::time::timeout(STOP_TIMEOUT, &mut build).await.is_err() {
        build.abort();
    }
}

/// Watch the directory holding `path` and signal events touching the file.
///
/// The directory is watched rather than the file so that delete-and-recreate
/// saves and removal followed by restoration are both seen.
fn watch_config(path: &Path) -> Result<(RecommendedWatcher, mpsc::Receiver<()>)> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("config path has no parent: {}", path.display()))?
        .to_path_buf();
    let name = path.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::channel(16);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name().map(|n| n.to_os_string()) == name);
        if touches_config {
            // Full means a reload is already pending.
            let _ = tx.try_send(());
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}
