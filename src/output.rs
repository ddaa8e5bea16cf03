//! Artifact placement and removal.
//!
//! ```text
//! src/pages/app.js       → out/pages/app.js       + out/pages/app.js.map
//! src/theme/main.scss    → out/theme/main.css     + out/theme/main.css.map
//! ```
//!
//! Only file I/O lives here. Compilation happens before, in the builder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::SourceKind;

/// Suffix of the sidecar sourcemap file.
pub const MAP_SUFFIX: &str = ".map";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("`{}` is not under source root `{}`", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("IO error when writing `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Artifact and sidecar map location of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPaths {
    pub artifact: PathBuf,
    pub map: PathBuf,
}

impl ArtifactPaths {
    fn for_artifact(artifact: PathBuf) -> Self {
        let mut map = artifact.clone().into_os_string();
        map.push(MAP_SUFFIX);
        Self {
            artifact,
            map: PathBuf::from(map),
        }
    }
}

/// Mirrors entries from the source root into the output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl OutputWriter {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Where the artifact pair of `entry` goes.
    pub fn paths_for(&self, entry: &Path, kind: SourceKind) -> Result<ArtifactPaths, OutputError> {
        let relative =
            entry
                .strip_prefix(&self.source_root)
                .map_err(|_| OutputError::OutsideRoot {
                    path: entry.to_path_buf(),
                    root: self.source_root.clone(),
                })?;

        let mut artifact = self.output_root.join(relative);
        if let Some(ext) = kind.artifact_extension() {
            artifact.set_extension(ext);
        }
        Ok(ArtifactPaths::for_artifact(artifact))
    }

    /// Other sources next to `entry` that write the same artifact.
    ///
    /// Only kinds whose extension is rewritten can collide: `main.scss` and
    /// `main.sass` both become `main.css`.
    pub fn colliding_sources(&self, entry: &Path, kind: SourceKind) -> Vec<PathBuf> {
        if kind.artifact_extension().is_none() {
            return Vec::new();
        }
        let own = entry.extension().and_then(|e| e.to_str()).unwrap_or_default();
        kind.source_extensions()
            .iter()
            .filter(|ext| !ext.eq_ignore_ascii_case(own))
            .map(|ext| entry.with_extension(ext))
            .filter(|sibling| sibling.is_file())
            .collect()
    }

    /// Write the artifact and its sidecar map, creating parent directories.
    ///
    /// A sourcemap link comment is appended to the artifact.
    pub fn write(
        &self,
        entry: &Path,
        kind: SourceKind,
        content: &str,
        source_map: &str,
    ) -> Result<ArtifactPaths, OutputError> {
        let paths = self.paths_for(entry, kind)?;

        if let Some(parent) = paths.artifact.parent() {
            fs::create_dir_all(parent).map_err(|source| OutputError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let body = with_map_link(content, kind, &paths.map);
        write_file(&paths.artifact, &body)?;
        write_file(&paths.map, source_map)?;

        Ok(paths)
    }

    /// Delete the artifact pair of `entry`. Missing files are not an error.
    ///
    /// Returns how many files were actually deleted.
    pub fn remove(&self, entry: &Path, kind: SourceKind) -> Result<usize, OutputError> {
        let paths = self.paths_for(entry, kind)?;
        let mut removed = 0;
        for path in [&paths.artifact, &paths.map] {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(OutputError::Io {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        Ok(removed)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), OutputError> {
    fs::write(path, content).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Append the `sourceMappingURL` comment for the sidecar map.
fn with_map_link(content: &str, kind: SourceKind, map: &Path) -> String {
    let name = map
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    let separator = if content.is_empty() || content.ends_with('\n') {
        ""
    } else {
        "\n"
    };

    match kind {
        SourceKind::Stylesheet => format!("{content}{separator}/*# sourceMappingURL={name} */\n"),
        SourceKind::Script | SourceKind::Ignored => {
            format!("{content}{separator}//# sourceMappingURL={name}\n")
        }
    }
}
