use std::path::{Path, PathBuf};

use super::*;
use crate::compiler::DEFAULT_BROWSERS;

fn root() -> PathBuf {
    PathBuf::from("/project")
}

fn parse_toml(content: &str) -> (WatchConfig, Diagnostics) {
    WatchConfig::parse(content, ConfigFormat::Toml, &root()).unwrap()
}

fn parse_json(content: &str) -> (WatchConfig, Diagnostics) {
    WatchConfig::parse(content, ConfigFormat::Json, &root()).unwrap()
}

#[test]
fn test_format_from_extension() {
    assert_eq!(ConfigFormat::from_path(Path::new("minikit.toml")), ConfigFormat::Toml);
    assert_eq!(ConfigFormat::from_path(Path::new("minikit.JSON")), ConfigFormat::Json);
    assert_eq!(ConfigFormat::from_path(Path::new("minikit")), ConfigFormat::Toml);
}

#[test]
fn test_toml_targets_with_defaults() {
    let (config, diagnostics) = parse_toml(
        r#"
[[target]]
src = "assets/src"
out = "assets/dist"

[[target]]
src = "theme"
out = "public/theme"
strategy = "rescan"
minify = false
browsers = "defaults"
"#,
    );

    assert!(diagnostics.is_empty());
    assert_eq!(config.targets.len(), 2);

    let first = &config.targets[0];
    assert_eq!(first.src(), Path::new("/project/assets/src"));
    assert_eq!(first.out(), Path::new("/project/assets/dist"));
    assert_eq!(first.strategy, Strategy::Targeted);
    assert!(first.options.minify);
    assert_eq!(first.options.browsers, DEFAULT_BROWSERS);

    let second = &config.targets[1];
    assert_eq!(second.strategy, Strategy::Rescan);
    assert!(!second.options.minify);
    assert_eq!(second.options.browsers, "defaults");
}

#[test]
fn test_json_object_layout() {
    let (config, diagnostics) =
        parse_json(r#"{ "target": [ { "src": "src", "out": "dist", "minify": false } ] }"#);

    assert!(diagnostics.is_empty());
    assert_eq!(config.targets.len(), 1);
    assert!(!config.targets[0].options.minify);
}

#[test]
fn test_json_legacy_array_layout() {
    let (config, _) = parse_json(
        r#"[ { "src": "js/src", "out": "js/dist" }, { "src": "css/src", "out": "css/dist" } ]"#,
    );

    let keys: Vec<_> = config.targets.iter().map(|t| t.key.src.clone()).collect();
    assert_eq!(
        keys,
        vec![PathBuf::from("/project/js/src"), PathBuf::from("/project/css/src")]
    );
}

#[test]
fn test_unknown_fields_collected() {
    let (config, diagnostics) = parse_toml(
        r#"
verbose = true

[[target]]
src = "src"
out = "dist"
watch_glob = "*.js"
"#,
    );

    assert_eq!(config.targets.len(), 1);
    assert!(diagnostics.ignored.contains(&"verbose".to_string()));
    assert!(diagnostics.ignored.contains(&"target[0].watch_glob".to_string()));
}

#[test]
fn test_invalid_target_skipped_others_kept() {
    let (config, diagnostics) = parse_toml(
        r#"
[[target]]
src = "src"

[[target]]
src = "a"
out = "a"

[[target]]
src = "ok/src"
out = "ok/dist"
"#,
    );

    assert_eq!(config.targets.len(), 1);
    assert_eq!(config.targets[0].src(), Path::new("/project/ok/src"));

    let indices: Vec<_> = diagnostics.skipped.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1]);
    assert!(matches!(diagnostics.skipped[0].1, ConfigError::Toml(_)));
    assert!(matches!(diagnostics.skipped[1].1, ConfigError::Validation(_)));
}

#[test]
fn test_output_inside_source_rejected() {
    let (config, diagnostics) = parse_toml("[[target]]\nsrc = \"src\"\nout = \"src/dist\"\n");

    assert!(config.targets.is_empty());
    assert!(matches!(diagnostics.skipped[0].1, ConfigError::Validation(_)));
}

#[test]
fn test_duplicate_target_skipped() {
    let (config, diagnostics) = parse_json(
        r#"[ { "src": "src", "out": "dist" }, { "src": "./src", "out": "dist/" } ]"#,
    );

    assert_eq!(config.targets.len(), 1);
    assert_eq!(diagnostics.skipped.len(), 1);
    assert_eq!(diagnostics.skipped[0].0, 1);
}

#[test]
fn test_unknown_strategy_skips_target() {
    let (config, diagnostics) =
        parse_toml("[[target]]\nsrc = \"src\"\nout = \"dist\"\nstrategy = \"sometimes\"\n");

    assert!(config.targets.is_empty());
    assert_eq!(diagnostics.skipped.len(), 1);
}

#[test]
fn test_syntax_error_fails_whole_file() {
    assert!(matches!(
        WatchConfig::parse("[[target]\n", ConfigFormat::Toml, &root()),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        WatchConfig::parse("{", ConfigFormat::Json, &root()),
        Err(ConfigError::Json(_))
    ));
    assert!(matches!(
        WatchConfig::parse("42", ConfigFormat::Json, &root()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_empty_config_has_no_targets() {
    let (config, diagnostics) = parse_toml("");
    assert!(config.targets.is_empty());
    assert!(diagnostics.is_empty());
}
