//! Compilation of flattened entries.
//!
//! ```text
//! entry ──► ImportResolver ──► Toolchain (script | style) ──► OutputWriter
//!                 │                                              ▲
//!                 └── DependencyGraph (record)      SingleFlight ┘ (commit)
//! ```
//!
//! The external stages (transform, minify, stylesheet compile, prefixing)
//! sit behind [`Compile`], so the pipeline can run with any implementation.

pub mod builder;
pub mod dependency;
pub mod flight;
mod script;
mod style;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::core::SourceKind;

pub use builder::{BuildError, BuildOutcome, Builder, RescanReport};
pub use dependency::{DependencyGraph, SharedGraph};
pub use flight::{SingleFlight, Ticket};
pub use script::ScriptCompiler;
pub use style::{CHARSET_PREFIX, StyleCompiler};

/// Browser targets used when none are configured.
pub const DEFAULT_BROWSERS: &str = "last 2 Chrome versions, last 2 Firefox versions, Safari >= 13";

/// One flattened source handed to a compiler.
#[derive(Debug, Clone, Copy)]
pub struct Unit<'a> {
    pub source: &'a str,
    /// File name hint for diagnostics and sourcemaps.
    pub filename: &'a str,
    /// Original entry path (decides syntax flavour and load paths).
    pub path: &'a Path,
}

/// Compiled code and its sourcemap as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub code: String,
    pub map: String,
    /// Files the compiler read by itself (Sass `@use` / `@import`).
    pub loaded: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{filename}: {message}")]
    Syntax { filename: String, message: String },

    #[error("invalid browser targets `{query}`: {message}")]
    Targets { query: String, message: String },

    #[error("{filename}: cannot produce sourcemap: {message}")]
    SourceMap { filename: String, message: String },
}

impl CompileError {
    pub(crate) fn syntax(unit: &Unit<'_>, message: impl Into<String>) -> Self {
        Self::Syntax {
            filename: unit.filename.to_string(),
            message: message.into(),
        }
    }
}

/// A compile stage: flattened text in, code + sourcemap out.
pub trait Compile: Send + Sync {
    fn compile(&self, unit: &Unit<'_>) -> Result<CompiledOutput, CompileError>;
}

/// Options shared by the default compilers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub minify: bool,
    /// Browserslist query for syntax lowering and prefixing.
    pub browsers: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            minify: true,
            browsers: DEFAULT_BROWSERS.to_string(),
        }
    }
}

/// Script and stylesheet compilers of one target.
#[derive(Clone)]
pub struct Toolchain {
    script: Arc<dyn Compile>,
    style: Arc<dyn Compile>,
}

impl Toolchain {
    pub fn new(script: Arc<dyn Compile>, style: Arc<dyn Compile>) -> Self {
        Self { script, style }
    }

    /// oxc for scripts, grass + lightningcss for stylesheets.
    pub fn from_options(options: &CompileOptions) -> Result<Self, CompileError> {
        Ok(Self::new(
            Arc::new(ScriptCompiler::new(options)?),
            Arc::new(StyleCompiler::new(options)?),
        ))
    }

    pub fn for_kind(&self, kind: SourceKind) -> Option<&dyn Compile> {
        match kind {
            SourceKind::Script => Some(self.script.as_ref()),
            SourceKind::Stylesheet => Some(self.style.as_ref()),
            SourceKind::Ignored => None,
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
