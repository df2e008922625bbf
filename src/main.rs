//! Command-line entry point for the configurability loader.
use anyhow::Result;
use clap::Parser;

use configurability::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    logging::init_subscriber(args.verbose, args.global.log_file.as_deref())?;
    let log = logging::Logger::new(args.global.log_file.clone());

    match args.selected_command() {
        cli::Command::Run => commands::run::run(&args.global, &log),
        cli::Command::Plan => commands::plan::run(&args.global, &log),
        cli::Command::Version => commands::version::run(&log),
    }
    Ok(())
}
