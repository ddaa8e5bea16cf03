//! minikit - an incremental build watcher for JS and SCSS.

#![allow(dead_code)]

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod logger;
mod output;
mod resolve;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::WatchConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    let config_path = utils::path::normalize_path(&config::locate(cli.config.as_deref()));
    debug!("config"; "using {}", config_path.display());

    match cli.command {
        Commands::Watch { .. } => cli::watch::watch(config_path),
        Commands::Build { .. } => cli::build::build_targets(&WatchConfig::load(&config_path)?),
    }
}
