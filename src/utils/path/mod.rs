//! Path utilities.
//!
//! Pure functions for path manipulation.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`)

pub mod fs;

pub use fs::{normalize_path, relative_display, resolve_path};
