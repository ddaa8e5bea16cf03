//! Per-target build driver.
//!
//! Owns everything one watch target needs to turn an entry into artifacts.
//! Called from blocking worker threads, never from the async loop directly.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use super::{CompiledOutput, SharedGraph, SingleFlight, Ticket, Toolchain, Unit};
use crate::compiler::CompileError;
use crate::core::{Classification, SourceKind, classify};
use crate::output::{ArtifactPaths, OutputError, OutputWriter};
use crate::resolve::{ImportResolver, ResolveError};
use crate::utils::path::{normalize_path, relative_display};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{}` is not a buildable entry", .0.display())]
    NotAnEntry(PathBuf),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// What became of one build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Written(ArtifactPaths),
    /// A newer request for the same entry took over; nothing was written.
    Superseded,
}

/// Results of a full rescan, sorted by entry path.
#[derive(Debug, Default)]
pub struct RescanReport {
    pub results: Vec<(PathBuf, Result<BuildOutcome, BuildError>)>,
}

impl RescanReport {
    pub fn built(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(BuildOutcome::Written(_))))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Build driver of one source root → output root pair.
pub struct Builder {
    source_root: PathBuf,
    resolver: ImportResolver,
    graph: SharedGraph,
    toolchain: Toolchain,
    writer: OutputWriter,
    flights: SingleFlight,
}

impl Builder {
    pub fn new(source_root: &Path, output_root: &Path, toolchain: Toolchain) -> Self {
        let source_root = normalize_path(source_root);
        let output_root = normalize_path(output_root);
        Self {
            writer: OutputWriter::new(&source_root, output_root),
            source_root,
            resolver: ImportResolver::new(),
            graph: super::DependencyGraph::shared(),
            toolchain,
            flights: SingleFlight::new(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        self.writer.output_root()
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn flights(&self) -> &SingleFlight {
        &self.flights
    }

    pub fn classify(&self, path: &Path) -> Classification {
        classify(path, &self.source_root)
    }

    /// Path relative to the source root, for log lines.
    pub fn display(&self, path: &Path) -> String {
        relative_display(path, &self.source_root)
    }

    /// Entries whose last successful resolution included `path`.
    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        self.graph.read().dependents(path)
    }

    /// Resolve, compile and write one entry.
    ///
    /// The dependency record is replaced as soon as resolution succeeds, even
    /// if compilation then fails, so editing a partial still rebuilds a broken
    /// entry. It holds the directive targets plus the files the compiler read
    /// by itself. A failed resolution only records for an entry that has no
    /// record yet, so a missing include that appears later triggers a build.
    /// Recording and writing only happen while `ticket` is current.
    pub fn build(&self, entry: &Path, ticket: &Ticket) -> Result<BuildOutcome, BuildError> {
        let class = self.classify(entry);
        if !class.is_buildable_entry() {
            return Err(BuildError::NotAnEntry(entry.to_path_buf()));
        }
        let Some(compiler) = self.toolchain.for_kind(class.kind) else {
            return Err(BuildError::NotAnEntry(entry.to_path_buf()));
        };

        let resolution = match self.resolver.resolve_discovering(entry, class.kind) {
            Ok(resolution) => resolution,
            Err(unresolved) => {
                self.flights.commit(ticket, || {
                    self.graph
                        .write()
                        .record_if_absent(entry, &unresolved.discovered);
                });
                return Err(unresolved.error.into());
            }
        };

        let filename = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let compiled = compiler.compile(&Unit {
            source: &resolution.text,
            filename: &filename,
            path: entry,
        });

        let recorded = self.flights.commit(ticket, || {
            self.record(entry, &resolution.dependencies, compiled.as_ref().ok());
        });
        if recorded.is_none() {
            crate::debug!("build"; "superseded after compile: {}", self.display(entry));
            return Ok(BuildOutcome::Superseded);
        }
        let output = compiled?;

        for other in self.writer.colliding_sources(entry, class.kind) {
            crate::logger::status_warning(&format!(
                "{} and {} write the same artifact, the last build wins",
                self.display(entry),
                self.display(&other)
            ));
        }

        match self.flights.commit(ticket, || {
            self.writer
                .write(entry, class.kind, &output.code, &output.map)
        }) {
            Some(written) => Ok(BuildOutcome::Written(written?)),
            None => {
                crate::debug!("build"; "superseded before write: {}", self.display(entry));
                Ok(BuildOutcome::Superseded)
            }
        }
    }

    /// Replace the record of `entry` with its directive targets plus what
    /// the compiler loaded. What a failed compile loaded is unknown, so the
    /// earlier record's extra files are kept then.
    fn record(&self, entry: &Path, dependencies: &[PathBuf], output: Option<&CompiledOutput>) {
        let mut graph = self.graph.write();
        let mut all = dependencies.to_vec();
        match output {
            Some(output) => all.extend(output.loaded.iter().cloned()),
            None => all.extend(graph.uses(entry).unwrap_or_default().iter().cloned()),
        }
        graph.record(entry, &all);
    }

    /// Begin a ticket and build in one go.
    pub fn build_now(&self, entry: &Path) -> Result<BuildOutcome, BuildError> {
        let ticket = self.flights.begin(entry);
        self.build(entry, &ticket)
    }

    /// Forget `entry` and delete its artifact pair.
    ///
    /// `ticket` supersedes any build of the entry still in flight; if a newer
    /// request (the entry came back) took over meanwhile, nothing happens.
    /// Returns the deleted file count.
    pub fn remove(
        &self,
        entry: &Path,
        kind: SourceKind,
        ticket: &Ticket,
    ) -> Result<usize, BuildError> {
        let removed = self.flights.commit(ticket, || {
            self.graph.write().remove(entry);
            self.writer.remove(entry, kind)
        });
        Ok(removed.transpose()?.unwrap_or(0))
    }

    /// Begin a ticket and remove in one go.
    #[cfg(test)]
    pub fn remove_now(&self, entry: &Path, kind: SourceKind) -> Result<usize, BuildError> {
        let ticket = self.flights.begin(entry);
        self.remove(entry, kind, &ticket)
    }

    /// Every buildable entry under the source root, sorted.
    ///
    /// Hidden files and directories are skipped by the walker.
    pub fn scan_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = jwalk::WalkDir::new(&self.source_root)
            .skip_hidden(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|p| self.classify(p).is_buildable_entry())
            .collect();
        entries.sort();
        entries
    }

    /// Rebuild every entry in parallel.
    pub fn rescan(&self) -> RescanReport {
        let entries = self.scan_entries();
        crate::debug!("build"; "rescan: {} entries", entries.len());

        let results = entries
            .into_par_iter()
            .map(|entry| {
                let result = self.build_now(&entry);
                (entry, result)
            })
            .collect();
        RescanReport { results }
    }

    /// Stop accepting results. In-flight builds finish without writing.
    pub fn close(&self) {
        self.flights.close();
    }

    /// Log one build result the way the watch loop and `build` both do.
    pub fn report(&self, entry: &Path, result: &Result<BuildOutcome, BuildError>) {
        match result {
            Ok(BuildOutcome::Written(paths)) => {
                crate::logger::status_success(&format!(
                    "{} → {}",
                    self.display(entry),
                    relative_display(&paths.artifact, self.output_root())
                ));
            }
            Ok(BuildOutcome::Superseded) => {}
            Err(e) => {
                crate::logger::status_error(&self.display(entry), &format_error_chain(e));
            }
        }
    }
}

/// Render an error with its `source()` chain, one cause per line.
pub fn format_error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\n  caused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
