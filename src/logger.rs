//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, printed only with `--verbose`
//! - `WatchStatus` for timestamped build results
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "{} built, {} failed", built, failed);
//! status_success("app.js → app.js");
//! status_error("theme/main.scss", "expected \";\"");
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "watch" => prefix.bright_green().bold().to_string(),
        "build" => prefix.bright_blue().bold().to_string(),
        "remove" => prefix.bright_magenta().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (timestamped results)
// ============================================================================

/// Current UTC time formatted as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    clock(secs)
}

fn clock(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Timestamped build results.
///
/// Entries of several targets finish concurrently, so results are appended
/// rather than overwritten; the global lock keeps a multi-line error block
/// from interleaving with other output.
///
/// # Example
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("app.js → app.js");
/// status.error("theme/main.scss", "expected \";\"");
/// ```
pub struct WatchStatus {
    /// Lines written so far
    written: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { written: 0 }
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(&format!("{}", "✓".green()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        self.display(&format!("{}", "✗".red()), &error_message(summary, detail));
    }

    /// Display warning message (⚠ prefix, yellow).
    pub fn warning(&mut self, detail: &str) {
        self.display(&format!("{}", "⚠".yellow()), detail);
    }

    fn display(&mut self, symbol: &str, message: &str) {
        let timestamp = format!("[{}]", now()).dimmed().to_string();

        let mut stdout = stdout().lock();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.written += line_count(message);
    }
}

fn error_message(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

/// Global watch status: warning
pub fn status_warning(detail: &str) {
    WATCH_STATUS.lock().warning(detail);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_status_counts_lines() {
        let mut status = WatchStatus::new();
        status.success("app.js → app.js");
        status.error("main.scss", "expected \";\"\n  caused by: eof");
        assert_eq!(status.written, 4);
    }

    #[test]
    fn test_error_message_without_detail() {
        assert_eq!(error_message("app.js", ""), "app.js");
        assert_eq!(error_message("app.js", "boom"), "app.js\nboom");
    }

    #[test]
    fn test_clock_wraps_days() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(86400 + 3661), "01:01:01");
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
