//! CLI argument parsing for goldbatch.
//!
//! Provides the command-line interface for the goldbatch binary with
//! run and clean subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use goldbatch_diff::DiffOptions;
use thiserror::Error;

/// Default golden directory for diffs.
pub const DEFAULT_GOLDEN_DIR: &str = "golden";

/// Default maximum number of conversion processes.
pub const DEFAULT_PROCESS_MAX: usize = 64;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("--exe must not be empty")]
    EmptyExe,

    #[error("--out-dir must not be empty")]
    EmptyOutDir,
}

/// goldbatch - batch conversion regression harness.
///
/// Converts every job listed in CSV job lists with a bounded process pool
/// and diffs the produced output tree against a golden reference tree.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "goldbatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert all listed jobs and diff the output against the golden tree.
    Run(RunArgs),
    /// Move the output directory aside to a numbered backup.
    Clean(CleanArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Job list CSV paths.
    #[arg(required = true)]
    pub lists: Vec<PathBuf>,

    /// Converter executable path.
    #[arg(long)]
    pub exe: String,

    /// Additional arguments passed to the converter (shell-style quoting).
    #[arg(short = 'a', long = "args", default_value = "", allow_hyphen_values = true)]
    pub extra_args: String,

    /// Input root directory; job sources are relative to this.
    #[arg(short = 'i', long, default_value = ".")]
    pub in_dir: PathBuf,

    /// Output root directory.
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Golden directory for diffs.
    #[arg(short = 'g', long, default_value = DEFAULT_GOLDEN_DIR)]
    pub golden_dir: PathBuf,

    /// Extension appended to each job's output file name (e.g. ".pack").
    #[arg(short = 't', long, default_value = "")]
    pub out_ext: String,

    /// Number of conversion processes. 0 uses all available cores.
    #[arg(long, default_value_t = 0)]
    pub processes: usize,

    /// Maximum number of processes to use. Set to 0 for unlimited.
    #[arg(long, default_value_t = DEFAULT_PROCESS_MAX)]
    pub process_max: usize,

    /// Disable the diff step.
    #[arg(long, default_value_t = false)]
    pub no_diff: bool,

    /// Formatted command to perform line diffs, with {0}/{1} placeholders.
    #[arg(long)]
    pub diff_command: Option<String>,

    /// Archive extension given entry-level tolerant comparison.
    #[arg(long, default_value = "zip")]
    pub archive_ext: String,

    /// Text extension eligible for line diffs (repeatable).
    #[arg(long = "text-ext")]
    pub text_exts: Vec<String>,

    /// Per-channel tolerance for embedded image comparison (0-255).
    #[arg(long, default_value_t = 3)]
    pub tolerance: u8,

    /// Path to file that receives a one-line build summary.
    #[arg(long)]
    pub summary_out: Option<PathBuf>,

    /// Path to file that receives a machine-readable JSON run summary.
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Disable ANSI colors.
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
}

impl RunArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.exe.trim().is_empty() {
            return Err(CliError::EmptyExe);
        }
        Ok(())
    }

    /// Diff options assembled from the diff-related flags.
    pub fn diff_options(&self) -> DiffOptions {
        let mut text_exts: Vec<String> = self.text_exts.iter().map(|e| normalize_ext(e)).collect();
        if text_exts.is_empty() {
            text_exts.push("txt".to_string());
        }
        DiffOptions {
            archive_ext: normalize_ext(&self.archive_ext),
            text_exts,
            tolerance: self.tolerance,
            diff_command: self.diff_command.clone(),
        }
    }

    /// Output extension with a leading dot, or empty for none.
    pub fn normalized_out_ext(&self) -> String {
        if self.out_ext.is_empty() {
            String::new()
        } else if self.out_ext.starts_with('.') {
            self.out_ext.clone()
        } else {
            format!(".{}", self.out_ext)
        }
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Arguments for the clean command.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct CleanArgs {
    /// Output root directory to move aside.
    #[arg(short = 'o', long)]
    pub out_dir: PathBuf,

    /// Disable ANSI colors.
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
}

impl CleanArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.out_dir.as_os_str().is_empty() {
            return Err(CliError::EmptyOutDir);
        }
        Ok(())
    }
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
