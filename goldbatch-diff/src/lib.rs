//! Golden-tree diff engine.
//!
//! Compares a test output tree against a known-correct golden tree
//! file-by-file (full content comparison), classifying every file as
//! match, mismatch, missing or extra. Archive outputs get entry-level
//! comparison with a pixel-tolerant fallback for embedded images, so lossy
//! re-encoding does not register as a regression. Text-format mismatches
//! are additionally run through an external line-diff command.

pub mod archive;
pub mod golden;
pub mod image_diff;
pub mod linediff;
pub mod tree;

pub use archive::archives_match;
pub use golden::{diff_with_golden, format_bytes, DiffTotals};
pub use image_diff::images_match;
pub use linediff::{default_diff_command, find_exe, run_line_diff, split_command};
pub use tree::{diff_trees, DiffOptions, TreeDiff};
