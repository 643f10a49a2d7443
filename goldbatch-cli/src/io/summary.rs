//! Run summary outputs.
//!
//! Two forms: a one-line human summary for build logs, and a
//! machine-readable JSON summary for CI consumption. Both are
//! deterministic for a given run outcome.

use goldbatch_diff::DiffTotals;
use goldbatch_pool::Job;
use serde::{Deserialize, Serialize};

/// Machine-readable summary of one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Jobs whose converter exited 0.
    pub converted: usize,
    /// Jobs that failed to run or exited nonzero.
    pub failed: usize,
    /// Conversion phase wall time in seconds.
    pub elapsed_sec: f64,
    /// Files equal to their golden counterpart.
    pub matches: usize,
    /// Files differing from their golden counterpart.
    pub mismatches: usize,
    /// Golden files absent from the test output.
    pub missing: usize,
    /// Test output files absent from the golden tree.
    pub extra: usize,
}

impl RunSummary {
    /// Serialize to pretty JSON with a trailing newline.
    pub fn to_json(&self) -> String {
        let mut json =
            serde_json::to_string_pretty(self).expect("RunSummary serialization cannot fail");
        json.push('\n');
        json
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One-line summary of build and diff results.
pub fn summary_line(failed: &[&Job], totals: &DiffTotals) -> String {
    let has_diffs = !totals.passed();
    if failed.is_empty() && !has_diffs {
        return "Conversion successful. No differences detected.".to_string();
    }
    let mut summary = String::new();
    if !failed.is_empty() {
        summary.push_str(&format!(
            "Failed converting {} file(s) ({}).",
            failed.len(),
            brief_job_listing(failed)
        ));
    }
    if has_diffs {
        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(&format!(
            "Detected golden file differences. {} different, {} missing, {} extra.",
            totals.mismatches, totals.missing, totals.extra
        ));
    }
    summary
}

/// Brief one-line listing of job names (truncated if necessary).
fn brief_job_listing(jobs: &[&Job]) -> String {
    let count = jobs.len().min(2);
    let mut listing = String::new();
    for job in &jobs[..count] {
        if !listing.is_empty() {
            listing.push_str(", ");
        }
        listing.push_str(&job.name);
    }
    if jobs.len() > count {
        listing.push_str(&format!(", ...(and {} more)", jobs.len() - count));
    }
    listing
}
