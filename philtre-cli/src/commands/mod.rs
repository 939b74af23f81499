//! CLI command implementations.

mod extract;
mod merge;
mod show;

pub use extract::ExtractCommand;
pub use merge::MergeCommand;
pub use show::ShowCommand;
