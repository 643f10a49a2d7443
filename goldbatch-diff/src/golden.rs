//! Per-run golden comparison and reporting.

use std::fs;
use std::path::Path;

use goldbatch_log::{colorize, Color, Logger};

use crate::linediff::{default_diff_command, run_line_diff};
use crate::tree::{diff_trees, DiffOptions, TreeDiff};

/// Aggregate diff counts across jobs and lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffTotals {
    pub matches: usize,
    pub mismatches: usize,
    pub missing: usize,
    pub extra: usize,
}

impl DiffTotals {
    /// Sum another total into this one.
    pub fn add(&mut self, other: DiffTotals) {
        self.matches += other.matches;
        self.mismatches += other.mismatches;
        self.missing += other.missing;
        self.extra += other.extra;
    }

    /// True when no mismatch, missing or extra file was recorded.
    pub fn passed(&self) -> bool {
        self.mismatches == 0 && self.missing == 0 && self.extra == 0
    }
}

/// Format a byte count as human-readable text.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes < KB {
        format!("{} b", bytes)
    } else if bytes < MB {
        format!("{:.2} kb", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} mb", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} gb", bytes as f64 / GB as f64)
    }
}

fn file_size_text(path: &Path) -> String {
    fs::metadata(path)
        .map(|meta| format_bytes(meta.len()))
        .unwrap_or_else(|_| "missing".to_string())
}

fn colorized_count(text: String, count: usize, colored: bool) -> String {
    if colored && count > 0 {
        colorize(&text, Color::Magenta)
    } else {
        text
    }
}

/// One-line diff summary suffix, nonzero counts colorized.
pub fn summary_suffix(
    colored: bool,
    same: usize,
    different: usize,
    missing: usize,
    extra: usize,
) -> String {
    format!(
        " {} same, {}, {}, {}.",
        same,
        colorized_count(format!("{} different", different), different, colored),
        colorized_count(format!("{} missing", missing), missing, colored),
        colorized_count(format!("{} extra", extra), extra, colored),
    )
}

/// Diff test output against the golden tree for one job list.
///
/// Comparison runs once per job destination subtree (so differences are
/// attributed to the job that produced them) plus once for the list's own
/// result text file. Missing and extra paths are printed as discovered;
/// mismatches are printed with size deltas and, for text formats, fed to
/// the external line-diff command, whose combined output is written to
/// `diffs_name` under `out_dir` only when nonempty.
#[allow(clippy::too_many_arguments)]
pub fn diff_with_golden<L: Logger + ?Sized>(
    golden_root: &Path,
    test_root: &Path,
    out_dir: &Path,
    job_dirs: &[String],
    result_rel: &str,
    options: &DiffOptions,
    diffs_name: &str,
    colored: bool,
    logger: &L,
) -> DiffTotals {
    let mut diff = TreeDiff::new();
    for dst in job_dirs {
        diff.extend(diff_trees(
            &golden_root.join(dst),
            &test_root.join(dst),
            golden_root,
            options,
        ));
    }

    // The list's result text is itself diffed against its golden copy.
    let result_gold = golden_root.join(result_rel);
    let result_test = test_root.join(result_rel);
    if !result_test.exists() {
        diff.missing.push(result_rel.to_string());
    } else if !result_gold.exists() {
        diff.extra.push(result_rel.to_string());
    } else if files_equal(&result_gold, &result_test) {
        diff.matches.push(result_rel.to_string());
    } else {
        diff.mismatches.push(result_rel.to_string());
    }

    for rel in &diff.missing {
        logger.status(&format!("  Missing:   {}", rel));
    }
    for rel in &diff.extra {
        logger.status(&format!("  Extra:     {}", rel));
    }

    let diff_command = options.diff_command.clone().or_else(default_diff_command);

    let mut all_diffs = String::new();
    for rel in &diff.mismatches {
        let gold_path = golden_root.join(rel);
        let test_path = test_root.join(rel);
        logger.status(&format!(
            "  Different: {} ({} -> {})",
            rel,
            file_size_text(&gold_path),
            file_size_text(&test_path)
        ));
        if options.is_text(rel) {
            if let Some(command) = &diff_command {
                if let Some(text) = run_line_diff(command, &gold_path, &test_path) {
                    all_diffs.push_str(&text);
                }
            }
        }
    }

    let totals = DiffTotals {
        matches: diff.matches.len(),
        mismatches: diff.mismatches.len(),
        missing: diff.missing.len(),
        extra: diff.extra.len(),
    };

    if totals.passed() {
        logger.status(&format!("Diff Passed: {} same", totals.matches));
    } else {
        let label = if colored {
            colorize("Diff FAILED:", Color::Magenta)
        } else {
            "Diff FAILED:".to_string()
        };
        logger.status(&format!(
            "{}{}",
            label,
            summary_suffix(
                colored,
                totals.matches,
                totals.mismatches,
                totals.missing,
                totals.extra
            )
        ));
        if !all_diffs.is_empty() {
            let diffs_path = out_dir.join(diffs_name);
            logger.status(&format!(
                "  Writing line diffs to: {}",
                diffs_path.display()
            ));
            if let Err(err) = fs::write(&diffs_path, &all_diffs) {
                logger.error(&format!(
                    "Failed writing line diffs \"{}\": {}",
                    diffs_path.display(),
                    err
                ));
            }
        }
    }

    totals
}

fn files_equal(a: &Path, b: &Path) -> bool {
    match (fs::read(a), fs::read(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
