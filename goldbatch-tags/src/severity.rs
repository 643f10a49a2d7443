//! Per-line severity classification.

use std::sync::OnceLock;

use goldbatch_log::{colorize, Color};
use regex::Regex;

/// Message severity extracted from one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
    /// Line carried no recognizable severity; not counted in totals.
    Unknown,
}

impl Severity {
    /// The severities tracked in totals, in table order.
    pub const COUNTED: [Severity; 3] = [Severity::Info, Severity::Warn, Severity::Error];

    /// Index into per-severity arrays, or None for Unknown.
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Severity::Info => Some(0),
            Severity::Warn => Some(1),
            Severity::Error => Some(2),
            Severity::Unknown => None,
        }
    }

    /// Console color for messages of this severity.
    pub fn color(self) -> Color {
        match self {
            Severity::Error => Color::Red,
            Severity::Warn => Color::Yellow,
            _ => Color::Default,
        }
    }

    /// Header used in the per-tag statistics table.
    pub(crate) fn stats_header(self) -> &'static str {
        match self {
            Severity::Info => "Info:",
            Severity::Warn => "Warnings:",
            Severity::Error => "ERRORS:",
            Severity::Unknown => "",
        }
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"\[([A-Z0-9]+_(INFO|WARN|ERROR)_[A-Z0-9_]+)\]\s*$")
            .expect("tag pattern is valid")
    })
}

/// Classify one output line, returning its severity and tag code (if any).
///
/// Tagged lines are classified by the severity word embedded in the tag and
/// return the bracketed code without brackets. Untagged lines fall back to a
/// case-insensitive substring scan for `error:` then `warning:`.
pub fn classify_line(line: &str) -> (Severity, Option<&str>) {
    if let Some(caps) = tag_regex().captures(line) {
        let code = caps.get(1).map(|m| m.as_str());
        let severity = match caps.get(2).map(|m| m.as_str()) {
            Some("ERROR") => Severity::Error,
            Some("WARN") => Severity::Warn,
            _ => Severity::Info,
        };
        return (severity, code);
    }

    let lower = line.to_lowercase();
    if lower.contains("error:") {
        (Severity::Error, None)
    } else if lower.contains("warning:") {
        (Severity::Warn, None)
    } else {
        (Severity::Unknown, None)
    }
}

/// Returns true if any line of `output` classifies as an error.
pub fn has_error_line(output: &str) -> bool {
    output
        .lines()
        .any(|line| classify_line(line).0 == Severity::Error)
}

/// Colorize raw process output line by line according to severity.
pub fn colorize_output(output: &str) -> String {
    let mut colorized = String::with_capacity(output.len());
    for line in output.split_inclusive('\n') {
        let (severity, _) = classify_line(line.trim_end_matches('\n'));
        colorized.push_str(&colorize(line, severity.color()));
    }
    colorized
}
