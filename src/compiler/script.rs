//! Script compilation with oxc.
//!
//! parse → semantic → transform (lower to targets) → minify → codegen + map

use std::path::PathBuf;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{EnvOptions, TransformOptions, Transformer};

use super::{Compile, CompileError, CompileOptions, CompiledOutput, Unit};

/// Lowers, minifies and maps one flattened script.
#[derive(Debug)]
pub struct ScriptCompiler {
    minify: bool,
    transform: TransformOptions,
}

impl ScriptCompiler {
    pub fn new(options: &CompileOptions) -> Result<Self, CompileError> {
        let env = EnvOptions::from_browserslist_query(&options.browsers).map_err(|message| {
            CompileError::Targets {
                query: options.browsers.clone(),
                message,
            }
        })?;
        Ok(Self {
            minify: options.minify,
            transform: TransformOptions {
                env,
                ..TransformOptions::default()
            },
        })
    }
}

impl Compile for ScriptCompiler {
    fn compile(&self, unit: &Unit<'_>) -> Result<CompiledOutput, CompileError> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(unit.path).unwrap_or_else(|_| SourceType::mjs());

        let ret = Parser::new(&allocator, unit.source, source_type).parse();
        if !ret.errors.is_empty() {
            return Err(CompileError::syntax(unit, join_diagnostics(&ret.errors)));
        }
        let mut program = ret.program;

        let semantic = SemanticBuilder::new().build(&program);
        if !semantic.errors.is_empty() {
            return Err(CompileError::syntax(unit, join_diagnostics(&semantic.errors)));
        }
        let scoping = semantic.semantic.into_scoping();

        let ret = Transformer::new(&allocator, unit.path, &self.transform)
            .build_with_scoping(scoping, &mut program);
        if !ret.errors.is_empty() {
            return Err(CompileError::syntax(unit, join_diagnostics(&ret.errors)));
        }

        let scoping = if self.minify {
            let options = MinifierOptions {
                mangle: Some(MangleOptions::default()),
                compress: Some(CompressOptions::smallest()),
            };
            Minifier::new(options).minify(&allocator, &mut program).scoping
        } else {
            None
        };

        let comments = if self.minify {
            CommentOptions::disabled()
        } else {
            CommentOptions::default()
        };
        let ret = Codegen::new()
            .with_options(CodegenOptions {
                minify: self.minify,
                comments,
                source_map_path: Some(PathBuf::from(unit.filename)),
                ..CodegenOptions::default()
            })
            .with_scoping(scoping)
            .build(&program);

        let map = ret.map.ok_or_else(|| CompileError::SourceMap {
            filename: unit.filename.to_string(),
            message: "codegen returned no map".to_string(),
        })?;

        Ok(CompiledOutput {
            code: ret.code,
            map: map.to_json_string(),
            loaded: Vec::new(),
        })
    }
}

fn join_diagnostics<D: std::fmt::Display>(errors: &[D]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn compile(source: &str, minify: bool) -> Result<CompiledOutput, CompileError> {
        let compiler = ScriptCompiler::new(&CompileOptions {
            minify,
            ..CompileOptions::default()
        })
        .unwrap();
        compiler.compile(&Unit {
            source,
            filename: "app.js",
            path: Path::new("/src/app.js"),
        })
    }

    #[test]
    fn test_compiles_flattened_script() {
        let output = compile("console.log(0);;\nconsole.log(1);;", true).unwrap();
        assert!(output.code.contains("console.log"));
        assert!(output.map.contains("\"version\":3"));
    }

    #[test]
    fn test_minify_drops_comments() {
        let output = compile("// note\nconsole.log(1);", true).unwrap();
        assert!(!output.code.contains("note"));
    }

    #[test]
    fn test_syntax_error() {
        let err = compile("let = ;", true).unwrap_err();
        assert!(matches!(err, CompileError::Syntax { ref filename, .. } if filename == "app.js"));
    }

    #[test]
    fn test_invalid_targets() {
        let err = ScriptCompiler::new(&CompileOptions {
            minify: true,
            browsers: "nonexistentbrowser >= 5".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, CompileError::Targets { .. }));
    }
}
