//! Logging abstraction for testable console output.
//!
//! Provides a trait-based logging system that enables deterministic testing
//! of console output, plus the ANSI color support the harness reports use.

use std::io::Write;
use std::sync::{Arc, RwLock};

/// ANSI colors used by harness output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// No coloring.
    Default,
    /// Errors.
    Red,
    /// Warnings.
    Yellow,
    /// Diff differences.
    Magenta,
    /// Section and summary headers.
    Cyan,
}

impl Color {
    /// ANSI style code for this color, or None for the default color.
    fn code(self) -> Option<&'static str> {
        match self {
            Color::Default => None,
            Color::Red => Some("1;31"),
            Color::Yellow => Some("1;33"),
            Color::Magenta => Some("1;35"),
            Color::Cyan => Some("1;36"),
        }
    }
}

/// Wrap text in ANSI escape sequences for the given color.
///
/// The default color returns the text unchanged.
pub fn colorize(text: &str, color: Color) -> String {
    match color.code() {
        Some(code) => format!("\x1b[{}m{}\x1b[0m", code, text),
        None => text.to_string(),
    }
}

/// Trait for console output.
///
/// Implementations must be thread-safe; the scheduler logs from its control
/// loop while report assembly logs from the command layer.
pub trait Logger: Send + Sync {
    /// Log a status message.
    fn status(&self, message: &str);

    /// Log a status message in the given color.
    fn status_color(&self, message: &str, color: Color) {
        self.status(&colorize(message, color));
    }

    /// Log a warning (yellow).
    fn warn(&self, message: &str) {
        self.status_color(message, Color::Yellow);
    }

    /// Log an error (red).
    fn error(&self, message: &str) {
        self.status_color(message, Color::Red);
    }
}

/// Logger that writes to stderr.
#[derive(Debug)]
pub struct StderrLogger {
    color: bool,
}

impl StderrLogger {
    /// Create a stderr logger; `color` enables ANSI escape sequences.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Logger for StderrLogger {
    fn status(&self, message: &str) {
        let _ = writeln!(std::io::stderr(), "{}", message);
    }

    fn status_color(&self, message: &str, color: Color) {
        if self.color {
            self.status(&colorize(message, color));
        } else {
            self.status(message);
        }
    }
}

/// Mock logger for testing that captures all messages.
///
/// Messages are captured uncolored so assertions don't have to account for
/// escape sequences.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    messages: Arc<RwLock<Vec<String>>>,
}

impl MockLogger {
    /// Create a new mock logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured messages.
    pub fn messages(&self) -> Vec<String> {
        self.messages.read().unwrap().clone()
    }

    /// Check if any captured message contains the given substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.messages().iter().any(|m| m.contains(substring))
    }

    /// Get count of captured messages.
    pub fn count(&self) -> usize {
        self.messages.read().unwrap().len()
    }

    /// Clear all captured messages.
    pub fn clear(&self) {
        self.messages.write().unwrap().clear();
    }
}

impl Logger for MockLogger {
    fn status(&self, message: &str) {
        self.messages.write().unwrap().push(message.to_string());
    }

    fn status_color(&self, message: &str, _color: Color) {
        self.status(message);
    }
}
