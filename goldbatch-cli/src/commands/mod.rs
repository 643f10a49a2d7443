//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `run` - convert all listed jobs, then diff against the golden tree
//! - `clean` - move the output directory aside to a backup

pub mod clean;
pub mod run;

pub use clean::execute_clean;
pub use run::{execute_run, RunOutcome};

use crate::cli::CliError;
use crate::io::JobLoadError;
use thiserror::Error;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("job list error: {0}")]
    Load(#[from] JobLoadError),

    #[error("failed writing \"{file}\": {source}")]
    Write {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clean \"{path}\": {source}")]
    Clean {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
