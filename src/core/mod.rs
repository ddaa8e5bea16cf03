//! Core types - pure abstractions shared across the codebase.

mod category;
mod state;

pub use category::{Classification, PARTIAL_MARKER, SourceKind, Visibility, classify};
pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};
