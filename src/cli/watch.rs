//! `watch` command: run the supervisor on a tokio runtime.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::actor::Supervisor;

/// Supervise every target until Ctrl+C.
pub fn watch(config_path: PathBuf) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    crate::core::register_shutdown(shutdown_tx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(Supervisor::new(config_path).run(shutdown_rx))
}
