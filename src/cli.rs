// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::dag::graph::{BUILD, CLEAN, COMPILE, DEVELOP};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build a static site from its source tree, or serve it with live rebuilds.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the override config file (TOML).
    ///
    /// Its directory is the project root. A missing file means defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or `info` is used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the execution plan without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Clean, compile and assemble the deployable output tree.
    Build,
    /// Compile, then serve and rebuild on change until interrupted.
    Develop,
    /// Remove the temp and dist directories.
    Clean,
    /// Compile stylesheets, scripts and pages into the temp directory.
    Compile,
}

impl Command {
    /// Name of the graph node this command runs.
    pub fn task_name(self) -> &'static str {
        match self {
            Command::Build => BUILD,
            Command::Develop => DEVELOP,
            Command::Clean => CLEAN,
            Command::Compile => COMPILE,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
