//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the configurability loader.
#[derive(Parser, Debug)]
#[command(
    name = "configurability",
    about = "Apply customisation modules to host configuration files",
    version
)]
pub struct Cli {
    /// Subcommand to run; defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Directory containing loadable modules (overrides CONF_PLUGIN_FOLDER)
    #[arg(long, global = true)]
    pub plugin_dir: Option<PathBuf>,

    /// Directory of INI files declaring configuration sections (overrides CONF_ETC_FOLDER)
    #[arg(long, global = true)]
    pub etc_dir: Option<PathBuf>,

    /// Directory of customisation files (overrides CONF_CUSTOMISATION_FOLDER)
    #[arg(long, global = true)]
    pub customisation_dir: Option<PathBuf>,

    /// Also append every log line to this file; failing to open it is fatal
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Load every module and apply customisations
    Run,
    /// Show which sections have a customisation source, without loading modules
    Plan,
    /// Print version information
    Version,
}

impl Cli {
    /// The subcommand to execute, `run` when none was given.
    #[must_use]
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}
