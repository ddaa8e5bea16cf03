//! Stylesheet compilation.
//!
//! Sass/SCSS goes through grass, the resulting CSS through lightningcss for
//! vendor prefixing, minification and the sourcemap. Files grass pulls in
//! through native `@use` / `@import` are reported back as `loaded`.

use std::io;
use std::path::{Path, PathBuf};

use grass::{InputSyntax, OutputStyle};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use parking_lot::Mutex;

use super::{Compile, CompileError, CompileOptions, CompiledOutput, Unit};
use crate::utils::path::normalize_path;

/// Declared encoding, on its own first line of every stylesheet artifact.
pub const CHARSET_PREFIX: &str = "@charset \"UTF-8\";\n";

/// Disk access for grass that remembers every file it read.
#[derive(Debug, Default)]
struct RecordingFs {
    loaded: Mutex<Vec<PathBuf>>,
}

impl RecordingFs {
    fn into_loaded(self) -> Vec<PathBuf> {
        self.loaded.into_inner()
    }
}

impl grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let bytes = std::fs::read(path)?;
        self.loaded.lock().push(normalize_path(path));
        Ok(bytes)
    }
}

/// Compiles, prefixes, minifies and maps one flattened stylesheet.
#[derive(Debug)]
pub struct StyleCompiler {
    minify: bool,
    browsers: Option<Browsers>,
}

impl StyleCompiler {
    pub fn new(options: &CompileOptions) -> Result<Self, CompileError> {
        let browsers = Browsers::from_browserslist([options.browsers.as_str()]).map_err(|e| {
            CompileError::Targets {
                query: options.browsers.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            minify: options.minify,
            browsers,
        })
    }

    fn targets(&self) -> Targets {
        Targets {
            browsers: self.browsers,
            ..Targets::default()
        }
    }

    fn to_css(&self, unit: &Unit<'_>, fs: &RecordingFs) -> Result<String, CompileError> {
        let syntax = match unit.path.extension().and_then(|e| e.to_str()) {
            Some("sass") => InputSyntax::Sass,
            _ => InputSyntax::Scss,
        };
        let mut options = grass::Options::default()
            .fs(fs)
            .style(OutputStyle::Expanded)
            .input_syntax(syntax)
            .allows_charset(false);
        if let Some(dir) = unit.path.parent() {
            options = options.load_path(dir);
        }
        grass::from_string(unit.source.to_owned(), &options)
            .map_err(|e| CompileError::syntax(unit, e.to_string()))
    }
}

impl Compile for StyleCompiler {
    fn compile(&self, unit: &Unit<'_>) -> Result<CompiledOutput, CompileError> {
        let fs = RecordingFs::default();
        let css = self.to_css(unit, &fs)?;
        let targets = self.targets();

        let mut stylesheet = StyleSheet::parse(
            &css,
            ParserOptions {
                filename: unit.filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| CompileError::syntax(unit, e.to_string()))?;

        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| CompileError::syntax(unit, e.to_string()))?;

        let map_error = |e: parcel_sourcemap::SourceMapError| CompileError::SourceMap {
            filename: unit.filename.to_string(),
            message: e.to_string(),
        };

        let mut source_map = SourceMap::new("/");
        source_map.add_source(unit.filename);
        source_map.set_source_content(0, &css).map_err(map_error)?;

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                source_map: Some(&mut source_map),
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| CompileError::syntax(unit, e.to_string()))?;

        // The charset line sits above everything lightningcss mapped.
        source_map.offset_lines(0, 1).map_err(map_error)?;
        let map = source_map.to_json(None).map_err(map_error)?;
        Ok(CompiledOutput {
            code: format!("{CHARSET_PREFIX}{}", result.code),
            map,
            loaded: fs.into_loaded(),
        })
    }
}
