//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_path` - resolve relative paths against a base directory
//! - `relative_display` - short path for log output

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Canonical parent + file name (the file itself was deleted)
/// - Lexical cleanup of the absolute path
///
/// The parent fallback matters for removal events: a deleted partial must map
/// to the same key the resolver recorded while it still existed.
///
/// # Example
/// ```ignore
/// use minikit::utils::path::normalize_path;
/// let abs = normalize_path(Path::new("./src/app.js"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let absolute = clean_lexically(&absolute);

    if let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }

    absolute
}

/// Resolve `path` against `base` unless it is already absolute.
///
/// Expands a leading `~` first. Always returns a normalized absolute path.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = path
        .to_str()
        .map(|s| PathBuf::from(shellexpand::tilde(s).as_ref()))
        .unwrap_or_else(|| path.to_path_buf());

    if expanded.is_absolute() {
        normalize_path(&expanded)
    } else {
        normalize_path(&base.join(expanded))
    }
}

/// Path relative to `root` for display, or the full path if outside it.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Remove `.` and resolve `..` components without touching the filesystem.
fn clean_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_cleans_dot_segments() {
        let normalized = normalize_path(Path::new("/nonexistent/a/./b/../c.js"));
        assert_eq!(normalized, PathBuf::from("/nonexistent/a/c.js"));
    }

    #[test]
    fn test_normalize_deleted_file_matches_existing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("_util.js");
        std::fs::write(&file, "x").unwrap();
        let before = normalize_path(&file);

        std::fs::remove_file(&file).unwrap();
        let after = normalize_path(&file);

        assert_eq!(before, after);
    }

    #[test]
    fn test_resolve_path_absolute() {
        let resolved = resolve_path(Path::new("/absolute/path"), Path::new("/base"));
        assert_eq!(resolved, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_resolve_path_relative_to_base() {
        let resolved = resolve_path(Path::new("src/js"), Path::new("/project"));
        assert_eq!(resolved, PathBuf::from("/project/src/js"));
    }

    #[test]
    fn test_relative_display() {
        let root = Path::new("/project/src");
        assert_eq!(relative_display(Path::new("/project/src/a/b.js"), root), "a/b.js");
        assert_eq!(relative_display(Path::new("/other/c.js"), root), "/other/c.js");
    }
}
