//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental JS/SCSS build watcher
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the working directory
    /// [default: minikit.toml, then minikit.config.json]
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Watch { args } | Commands::Build { args } => args.verbose,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Supervise all targets and rebuild on change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: CommonArgs,
    },

    /// Build every target once and exit (non-zero on any failure)
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: CommonArgs,
    },
}

/// Arguments shared by all subcommands
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonArgs {
    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
