//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive
//! macros, including global options and subcommands.

use crate::commands::{ExtractCommand, MergeCommand, ShowCommand};
use clap::{Parser, Subcommand};

/// Command-line tool for the philtre parameter language.
#[derive(Parser)]
#[command(name = "philtre")]
#[command(version, about = "Work with hierarchical parameter files", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Pretty-print a parameter file
    Show(ShowCommand),

    /// Merge user parameter files onto a master schema
    Merge(MergeCommand),

    /// Print merged parameter values as JSON
    Extract(ExtractCommand),
}
