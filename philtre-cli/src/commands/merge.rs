//! Command to merge user parameter files onto a master schema.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use philtre::{FetchOptions, Session, ShowOptions};

use crate::error::CliError;
use crate::utils::{load_inputs, GlobalOptions};

/// Output format for the unused-parameter report.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum ReportFormat {
    /// One locator per line, human-readable.
    #[default]
    Text,
    /// A JSON array of locator strings.
    Json,
}

/// Merge user parameter files onto a master schema.
#[derive(Args)]
pub struct MergeCommand {
    /// Master schema file
    #[arg(value_name = "MASTER")]
    pub master: PathBuf,

    /// User parameter files, in increasing precedence
    #[arg(value_name = "SOURCES", required = true)]
    pub sources: Vec<PathBuf>,

    /// Print only values that differ from the master defaults
    #[arg(long)]
    pub diff: bool,

    /// Report source parameters that matched nothing in the master
    #[arg(long)]
    pub show_unused: bool,

    /// Format of the unused-parameter report
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Tolerate scope/definition mismatches instead of failing
    #[arg(long)]
    pub skip_incompatible: bool,
}

impl MergeCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut session = Session::new();
        let (master, sources) = load_inputs(&mut session, &self.master, &self.sources)?;
        let options = FetchOptions {
            diff: self.diff,
            skip_incompatible_objects: self.skip_incompatible,
            track_unused_definitions: self.show_unused,
        };
        let fetched = session.fetch(master, &sources, &options)?;
        print!(
            "{}",
            session.as_str(fetched.root, &ShowOptions::default())
        );
        if self.show_unused && !fetched.unused.is_empty() && global.chatty() {
            match self.format {
                ReportFormat::Text => {
                    eprintln!("Unused parameter definitions:");
                    for locator in &fetched.unused {
                        eprintln!("  {locator}");
                    }
                }
                ReportFormat::Json => {
                    let locators: Vec<String> =
                        fetched.unused.iter().map(ToString::to_string).collect();
                    eprintln!("{}", serde_json::to_string(&locators)?);
                }
            }
        }
        Ok(())
    }
}
