//! Command to print merged parameter values as JSON.

use std::path::PathBuf;

use clap::Args;
use philtre::{FetchOptions, Session};

use crate::error::CliError;
use crate::utils::{load_inputs, GlobalOptions};

/// Print merged parameter values as JSON.
#[derive(Args)]
pub struct ExtractCommand {
    /// Master schema file
    #[arg(value_name = "MASTER")]
    pub master: PathBuf,

    /// User parameter files, in increasing precedence
    #[arg(value_name = "SOURCES")]
    pub sources: Vec<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ExtractCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let mut session = Session::new();
        let (master, sources) = load_inputs(&mut session, &self.master, &self.sources)?;
        let fetched = session.fetch(master, &sources, &FetchOptions::default())?;
        let values = session.extract(fetched.root)?;
        let json = if self.pretty {
            serde_json::to_string_pretty(&values)?
        } else {
            serde_json::to_string(&values)?
        };
        println!("{json}");
        Ok(())
    }
}
