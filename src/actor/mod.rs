//! Actor System for Watch Mode
//!
//! Message-passing concurrency, one actor pair per target:
//!
//! ```text
//! Supervisor ──spawns──► FsActor --> BuildActor --> Builder (blocking)
//! (config)               (notify)    (plan/route)   (resolve, compile, write)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `build` - Event routing and per-entry build tasks
//! - `supervisor` - Target lifecycle and config reload

pub mod build;
pub mod fs;
pub mod messages;
pub mod supervisor;

pub use supervisor::Supervisor;
