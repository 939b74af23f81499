//! Utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use philtre::{NodeId, Session};

use crate::error::CliError;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,
}

impl GlobalOptions {
    /// Whether informational output should be printed.
    pub fn chatty(&self) -> bool {
        !self.quiet
    }
}

/// Parses a master file and a set of source files into one session,
/// expanding includes.
pub fn load_inputs(
    session: &mut Session,
    master: &Path,
    sources: &[PathBuf],
) -> Result<(NodeId, Vec<NodeId>), CliError> {
    if !master.exists() {
        return Err(CliError::InvalidArguments(format!(
            "file not found: {}",
            master.display()
        )));
    }
    let master_root = session.parse_file(master, true)?;
    let mut source_roots = Vec::with_capacity(sources.len());
    for source in sources {
        if !source.exists() {
            return Err(CliError::InvalidArguments(format!(
                "file not found: {}",
                source.display()
            )));
        }
        source_roots.push(session.parse_file(source, true)?);
    }
    Ok((master_root, source_roots))
}
