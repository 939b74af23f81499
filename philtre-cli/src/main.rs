//! Main entry point for the philtre CLI.
//!
//! Command-line interface for working with parameter files:
//! - `show`: pretty-print a parameter file
//! - `merge`: merge user files onto a master schema, optionally as a diff
//! - `extract`: print the merged values as JSON

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let logger = philtre::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        cli::Command::Show(cmd) => cmd.execute(&global),
        cli::Command::Merge(cmd) => cmd.execute(&global),
        cli::Command::Extract(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            logger.error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    }
}
