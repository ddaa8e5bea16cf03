//! Include directive scanning.
//!
//! A directive is a whole line of the form
//!
//! ```text
//! // @import "path";
//! // @codekit-prepend "path";
//! // @prepros-prepend 'path'
//! //@import path
//! ```
//!
//! Leading whitespace, quotes and the trailing `;` are optional. A line that
//! does not match in full is ordinary content.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::path::normalize_path;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*//[ \t]*@(?:import|codekit-prepend|prepros-prepend)[ \t]+['"]?([^'"\r\n]+?)['"]?[ \t]*;?[ \t]*\r?$"#,
    )
    .unwrap()
});

/// One include directive found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Path as written between the quotes.
    pub raw_path: String,
    /// `raw_path` resolved against the including file's directory.
    pub resolved_path: PathBuf,
    /// Byte range of the matched line (without its newline).
    pub span: Range<usize>,
}

/// Find every directive in `text`, in document order.
///
/// `including` is the file the text was read from; targets resolve relative
/// to its parent directory.
pub fn scan(text: &str, including: &Path) -> Vec<Directive> {
    let base = including.parent().unwrap_or(Path::new(""));

    DIRECTIVE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let raw_path = caps.get(1)?.as_str().trim();
            if raw_path.is_empty() {
                return None;
            }
            Some(Directive {
                raw_path: raw_path.to_string(),
                resolved_path: normalize_path(&base.join(raw_path)),
                span: whole.range(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_paths(text: &str) -> Vec<String> {
        scan(text, Path::new("/src/app.js"))
            .into_iter()
            .map(|d| d.raw_path)
            .collect()
    }

    #[test]
    fn test_all_aliases() {
        let text = "// @import \"a.js\";\n// @codekit-prepend \"b.js\";\n// @prepros-prepend \"c.js\";\n";
        assert_eq!(raw_paths(text), ["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_optional_quotes_and_terminator() {
        let text = "// @import a.js\n//@import 'b.js'\n  \t// @import \"c.js\"  \n// @import d.js;\n";
        assert_eq!(raw_paths(text), ["a.js", "b.js", "c.js", "d.js"]);
    }

    #[test]
    fn test_partial_line_is_content() {
        let text = "foo(); // @import \"a.js\";\n/* @import \"b.js\"; */\n// see @import \"c.js\" below\n";
        assert!(raw_paths(text).is_empty());
    }

    #[test]
    fn test_unknown_alias_is_content() {
        assert!(raw_paths("// @require \"a.js\";\n").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "// @import \"a.js\";\r\nconsole.log(1);\r\n";
        let found = scan(text, Path::new("/src/app.js"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_path, "a.js");
        assert_eq!(&text[found[0].span.end..], "\nconsole.log(1);\r\n");
    }

    #[test]
    fn test_span_excludes_newline() {
        let text = "// @import \"_util.js\";\nconsole.log(1);";
        let found = scan(text, Path::new("/src/app.js"));
        assert_eq!(found[0].span, 0..22);
        assert_eq!(&text[found[0].span.end..], "\nconsole.log(1);");
    }

    #[test]
    fn test_resolved_relative_to_including_dir() {
        let found = scan("// @import \"../lib/_x.js\"\n", Path::new("/nonexistent/src/pages/app.js"));
        assert_eq!(
            found[0].resolved_path,
            PathBuf::from("/nonexistent/src/lib/_x.js")
        );
    }
}
