//! Message totals, globally and per-tag.

use std::collections::BTreeMap;

use goldbatch_log::{colorize, Color};

use crate::severity::{classify_line, Severity};

/// Accumulates message totals per severity, plus per-tag counts.
///
/// Trackers merge across scopes (per-job into per-list into global); merge
/// is commutative and associative, so rollup order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTracker {
    totals: [u64; 3],
    tags: [BTreeMap<String, u64>; 3],
}

impl TagTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a tracker from log output text.
    pub fn from_output(output: &str) -> Self {
        let mut tracker = Self::new();
        tracker.add_output(output);
        tracker
    }

    /// Classify one line and add it to the totals.
    pub fn add_line(&mut self, line: &str) {
        let (severity, tag) = classify_line(line);
        if let Some(index) = severity.index() {
            self.totals[index] += 1;
            if let Some(tag) = tag {
                *self.tags[index].entry(tag.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Add totals from every line of log output text.
    pub fn add_output(&mut self, output: &str) {
        for line in output.lines() {
            self.add_line(line);
        }
    }

    /// Add totals from another tracker.
    pub fn merge(&mut self, other: &TagTracker) {
        for index in 0..self.totals.len() {
            self.totals[index] += other.totals[index];
            for (tag, count) in &other.tags[index] {
                *self.tags[index].entry(tag.clone()).or_insert(0) += count;
            }
        }
    }

    /// Running total for one severity (always 0 for Unknown).
    pub fn total(&self, severity: Severity) -> u64 {
        severity.index().map(|i| self.totals[i]).unwrap_or(0)
    }

    /// Number of lines that classified as errors.
    pub fn error_count(&self) -> u64 {
        self.total(Severity::Error)
    }

    /// Number of lines that classified as warnings.
    pub fn warning_count(&self) -> u64 {
        self.total(Severity::Warn)
    }

    fn total_suffix(&self, colored: bool, name: &str, severity: Severity) -> String {
        let total = self.total(severity);
        if total == 0 {
            return String::new();
        }
        let plurality = if total == 1 { "" } else { "s" };
        let text = format!(" {} {}{}.", total, name, plurality);
        if colored {
            colorize(&text, severity.color())
        } else {
            text
        }
    }

    /// One-line error/warning total summary suffix, e.g. " 2 errors. 1 warning."
    ///
    /// Reports nonzero severities only; empty when nothing classified.
    pub fn summary_suffix(&self, colored: bool) -> String {
        let mut summary = String::new();
        summary.push_str(&self.total_suffix(colored, "error", Severity::Error));
        summary.push_str(&self.total_suffix(colored, "warning", Severity::Warn));
        summary
    }

    /// Table of per-tag stats: a header per nonzero severity, tag lines
    /// sorted lexicographically.
    pub fn per_tag_stats(&self, colored: bool) -> String {
        let mut stats = String::new();
        for severity in Severity::COUNTED {
            let index = severity.index().expect("counted severity");
            if self.tags[index].is_empty() {
                continue;
            }
            let color = if colored {
                severity.color()
            } else {
                Color::Default
            };
            stats.push_str(&colorize(severity.stats_header(), color));
            stats.push('\n');
            for (tag, count) in &self.tags[index] {
                stats.push_str(&colorize(&format!("  {}({})\n", tag, count), color));
            }
        }
        stats
    }
}
