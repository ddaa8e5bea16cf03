//! Source file classification.
//!
//! Pure functions of the path and the source root: no I/O.
//!
//! ```text
//! src/app.js              → Script,     Entry
//! src/_util.js            → Script,     Partial
//! src/_lib/deep/x.js      → Script,     Partial   (any segment counts)
//! src/theme/main.scss     → Stylesheet, Entry
//! src/readme.md           → Ignored
//! ```

use std::path::{Component, Path};

/// Leading character that marks a path segment as partial.
pub const PARTIAL_MARKER: char = '_';

/// Kind of source file, determines which compiler handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// JavaScript (.js, .mjs) - transform + minify
    Script,
    /// Sass (.scss, .sass) - compile + prefix
    Stylesheet,
    /// Anything else - never built
    Ignored,
}

impl SourceKind {
    /// Detect source kind from file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" => Self::Script,
            "scss" | "sass" => Self::Stylesheet,
            _ => Self::Ignored,
        }
    }

    /// Detect source kind from file path.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Ignored, Self::from_extension)
    }

    /// Source extensions of this kind.
    pub fn source_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Script => &["js", "mjs"],
            Self::Stylesheet => &["scss", "sass"],
            Self::Ignored => &[],
        }
    }

    /// Extension of the compiled artifact, `None` when the source one is kept.
    pub fn artifact_extension(self) -> Option<&'static str> {
        match self {
            Self::Stylesheet => Some("css"),
            Self::Script | Self::Ignored => None,
        }
    }

    /// Text appended after every resolved unit.
    pub fn terminator(self) -> &'static str {
        match self {
            Self::Script => ";",
            Self::Stylesheet | Self::Ignored => "\n",
        }
    }

    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Ignored => "ignored",
        }
    }
}

/// Whether a file is compiled on its own or only inlined by others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Entry,
    Partial,
}

/// Result of classifying one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: SourceKind,
    pub visibility: Visibility,
}

impl Classification {
    /// Entry of a buildable kind: the only files that produce artifacts.
    pub fn is_buildable_entry(self) -> bool {
        self.kind != SourceKind::Ignored && self.visibility == Visibility::Entry
    }

    pub fn is_ignored(self) -> bool {
        self.kind == SourceKind::Ignored
    }
}

/// Classify `path` relative to `source_root`.
///
/// Paths outside the root and paths with a dot-prefixed segment are `Ignored`.
pub fn classify(path: &Path, source_root: &Path) -> Classification {
    let ignored = Classification {
        kind: SourceKind::Ignored,
        visibility: Visibility::Entry,
    };

    let Ok(relative) = path.strip_prefix(source_root) else {
        return ignored;
    };

    let mut visibility = Visibility::Entry;
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return ignored;
        };
        let segment = segment.to_string_lossy();
        if segment.starts_with('.') {
            return ignored;
        }
        if segment.starts_with(PARTIAL_MARKER) {
            visibility = Visibility::Partial;
        }
    }

    Classification {
        kind: SourceKind::from_path(relative),
        visibility,
    }
}
