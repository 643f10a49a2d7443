//! File input/output for the CLI layer.
//!
//! - Job-list loading and validation.
//! - Run summary outputs (one-line text and machine-readable JSON).

pub mod job_loader;
pub mod summary;

pub use job_loader::{load_jobs, parse_jobs, split_args, JobLoadError};
pub use summary::{summary_line, RunSummary};
