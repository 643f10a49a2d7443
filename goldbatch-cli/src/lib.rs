//! goldbatch CLI.
//!
//! Command-line interface for the batch conversion regression harness:
//! argument parsing, job-list loading, run/clean orchestration and exit
//! codes.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod io;

pub use cli::{parse_from, CleanArgs, Cli, CliError, Command, RunArgs};
pub use commands::{execute_clean, execute_run, CommandError, CommandResult, RunOutcome};
