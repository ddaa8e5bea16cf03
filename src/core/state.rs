//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SHUTDOWN_TX`: Wakes the supervisor so it can stop its targets

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the supervisor
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a supervisor has been registered:
/// - Before `register_shutdown()`: exit immediately, nothing to stop
/// - After `register_shutdown()`: set the flag and notify the supervisor
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        match SHUTDOWN_TX.get() {
            Some(tx) => {
                crate::log!("watch"; "shutting down...");
                let _ = tx.send(());
            }
            None => std::process::exit(0),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the supervisor's shutdown channel.
pub fn register_shutdown(tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(tx);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is starting
/// one more build before stopping, which is acceptable
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_defaults_off() {
        assert!(!is_shutdown());
    }
}
