//! Command to pretty-print a parameter file.

use std::path::PathBuf;

use clap::Args;
use philtre::{Session, ShowOptions};

use crate::error::CliError;
use crate::utils::GlobalOptions;

/// Pretty-print a parameter file.
#[derive(Args)]
pub struct ShowCommand {
    /// Parameter file to print
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Attribute detail level (0 = values only, up to 3 = everything)
    #[arg(long, value_name = "LEVEL", default_value_t = 0)]
    pub attributes_level: i64,

    /// Hide objects whose expert level exceeds this
    #[arg(long, value_name = "LEVEL")]
    pub expert_level: Option<i64>,

    /// Maximum output line width
    #[arg(long, value_name = "COLUMNS", default_value_t = 79)]
    pub width: usize,

    /// Leave include directives unexpanded
    #[arg(long)]
    pub keep_includes: bool,
}

impl ShowCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        if !(0..=3).contains(&self.attributes_level) {
            return Err(CliError::InvalidArguments(format!(
                "attributes level must be between 0 and 3, got {}",
                self.attributes_level
            )));
        }
        let mut session = Session::new();
        let root = session.parse_file(&self.file, !self.keep_includes)?;
        let options = ShowOptions {
            expert_level: self.expert_level,
            attributes_level: self.attributes_level,
            print_width: self.width,
        };
        print!("{}", session.as_str(root, &options));
        Ok(())
    }
}
