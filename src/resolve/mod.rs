//! Include resolution: flatten directive-based includes into one text.
//!
//! ```text
//! app.js                      _util.js
//! ┌──────────────────────┐    ┌─────────────────┐
//! │ // @import "_util.js"│ ─► │ console.log(0); │
//! │ console.log(1);      │    └─────────────────┘
//! └──────────────────────┘
//!           │
//!           ▼
//! console.log(0);;
//! console.log(1);;
//! ```
//!
//! Every resolved unit gets its kind's terminator appended, so inlined units
//! stay syntactically separate when concatenated.
//!
//! Cycles are cut with a visited set local to one top-level call: a file
//! that was already inlined contributes nothing the second time.

mod directive;


pub use directive::{Directive, scan};

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::compiler::DependencyGraph;
use crate::core::SourceKind;
use crate::utils::path::normalize_path;

/// Upper bound on include nesting. Cycles are already cut by the visited
/// set, this only guards against pathological chains.
pub const MAX_INCLUDE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot read `{}`{}", path.display(), included_from_suffix(included_from))]
    Read {
        path: PathBuf,
        included_from: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("include depth exceeds {limit} at `{}`", path.display())]
    TooDeep { path: PathBuf, limit: usize },
}

fn included_from_suffix(from: &Option<PathBuf>) -> String {
    from.as_ref()
        .map(|p| format!(" (included from `{}`)", p.display()))
        .unwrap_or_default()
}

/// Where source text comes from.
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Flattened entry text plus every file it pulled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    /// Distinct include targets, direct or transitive, in first-seen order.
    /// Never contains the entry itself.
    pub dependencies: Vec<PathBuf>,
}

/// A failed resolution plus the include targets noted before it failed.
///
/// The target that could not be read is among `discovered`.
#[derive(Debug)]
pub struct Unresolved {
    pub error: ResolveError,
    pub discovered: Vec<PathBuf>,
}

/// Directive inliner.
#[derive(Debug, Clone)]
pub struct ImportResolver<R = FsReader> {
    reader: R,
    max_depth: usize,
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportResolver {
    pub fn new() -> Self {
        Self::with_reader(FsReader)
    }
}

impl<R: SourceReader> ImportResolver<R> {
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader,
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Resolve `entry`, returning the flattened text and its dependencies.
    ///
    /// Fails as a whole if any file in the include tree cannot be read.
    pub fn resolve(&self, entry: &Path, kind: SourceKind) -> Result<Resolution, ResolveError> {
        self.resolve_discovering(entry, kind).map_err(|unresolved| unresolved.error)
    }

    /// Like [`resolve`](Self::resolve), but a failure still reports the
    /// include targets seen up to that point.
    pub fn resolve_discovering(
        &self,
        entry: &Path,
        kind: SourceKind,
    ) -> Result<Resolution, Unresolved> {
        let entry = normalize_path(entry);
        let mut walk = Walk {
            reader: &self.reader,
            terminator: kind.terminator(),
            max_depth: self.max_depth,
            entry: &entry,
            visited: FxHashSet::default(),
            dependencies: Vec::new(),
            recorded: FxHashSet::default(),
        };

        walk.visited.insert(entry.clone());
        match walk.inline(&entry, None, 0) {
            Ok(text) => Ok(Resolution {
                text,
                dependencies: walk.dependencies,
            }),
            Err(error) => Err(Unresolved {
                error,
                discovered: walk.dependencies,
            }),
        }
    }

    /// Resolve `entry` and, on success, replace its record in `graph`.
    ///
    /// A failed resolution never touches an existing record. An entry with
    /// no record yet gets the targets discovered so far, so it rebuilds once
    /// a missing include appears.
    pub fn resolve_into(
        &self,
        entry: &Path,
        kind: SourceKind,
        graph: &RwLock<DependencyGraph>,
    ) -> Result<String, ResolveError> {
        let key = normalize_path(entry);
        match self.resolve_discovering(entry, kind) {
            Ok(resolution) => {
                graph.write().record(&key, &resolution.dependencies);
                Ok(resolution.text)
            }
            Err(unresolved) => {
                graph.write().record_if_absent(&key, &unresolved.discovered);
                Err(unresolved.error)
            }
        }
    }
}

/// State of one top-level resolution.
struct Walk<'a, R> {
    reader: &'a R,
    terminator: &'static str,
    max_depth: usize,
    entry: &'a Path,
    visited: FxHashSet<PathBuf>,
    dependencies: Vec<PathBuf>,
    recorded: FxHashSet<PathBuf>,
}

impl<R: SourceReader> Walk<'_, R> {
    fn inline(
        &mut self,
        path: &Path,
        included_from: Option<&Path>,
        depth: usize,
    ) -> Result<String, ResolveError> {
        if depth > self.max_depth {
            return Err(ResolveError::TooDeep {
                path: path.to_path_buf(),
                limit: self.max_depth,
            });
        }

        let text = self
            .reader
            .read(path)
            .map_err(|source| ResolveError::Read {
                path: path.to_path_buf(),
                included_from: included_from.map(Path::to_path_buf),
                source,
            })?;

        let mut out = String::with_capacity(text.len() + 1);
        let mut last = 0;

        for directive in scan(&text, path) {
            out.push_str(&text[last..directive.span.start]);
            last = directive.span.end;

            let target = directive.resolved_path;
            self.note_dependency(&target);

            if !self.visited.insert(target.clone()) {
                crate::debug!("resolve"; "skip repeated include: {}", target.display());
                continue;
            }
            out.push_str(&self.inline(&target, Some(path), depth + 1)?);
        }

        out.push_str(&text[last..]);
        out.push_str(self.terminator);
        Ok(out)
    }

    fn note_dependency(&mut self, target: &Path) {
        if target != self.entry && self.recorded.insert(target.to_path_buf()) {
            self.dependencies.push(target.to_path_buf());
        }
    }
}
