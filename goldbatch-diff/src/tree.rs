//! Directory-tree comparison.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::archives_match;

/// Options controlling tree comparison.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Extension (without dot, lowercase) given entry-level tolerant
    /// comparison instead of a hard byte mismatch.
    pub archive_ext: String,
    /// Extensions (without dot, lowercase) eligible for external line diffs.
    pub text_exts: Vec<String>,
    /// Per-channel tolerance for embedded image comparison (0-255).
    pub tolerance: u8,
    /// Line-diff command template with `{0}`/`{1}` path placeholders.
    /// None probes for a default command.
    pub diff_command: Option<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            archive_ext: "zip".to_string(),
            text_exts: vec!["txt".to_string()],
            tolerance: 3,
            diff_command: None,
        }
    }
}

impl DiffOptions {
    pub(crate) fn is_archive(&self, rel_path: &str) -> bool {
        extension(rel_path).map(|ext| ext == self.archive_ext).unwrap_or(false)
    }

    pub(crate) fn is_text(&self, rel_path: &str) -> bool {
        extension(rel_path)
            .map(|ext| self.text_exts.iter().any(|text| *text == ext))
            .unwrap_or(false)
    }
}

fn extension(rel_path: &str) -> Option<String> {
    Path::new(rel_path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Classification of every file under a golden/test tree pair.
///
/// Paths are forward-slash relative to the comparison root; no path
/// appears in more than one set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Files with equal content (or archive-tolerant equal content).
    pub matches: Vec<String>,
    /// Files present on both sides with differing content.
    pub mismatches: Vec<String>,
    /// Files in the golden tree, absent or unreadable in the test tree.
    pub missing: Vec<String>,
    /// Files in the test tree with no golden counterpart.
    pub extra: Vec<String>,
}

impl TreeDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing mismatched, went missing or appeared extra.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty() && self.extra.is_empty()
    }

    /// Concatenate another diff's sets into this one.
    pub fn extend(&mut self, other: TreeDiff) {
        self.matches.extend(other.matches);
        self.mismatches.extend(other.mismatches);
        self.missing.extend(other.missing);
        self.extra.extend(other.extra);
    }
}

/// Compare the test tree against the golden tree.
///
/// `gold_root` determines the reported relative paths, allowing a
/// comparison rooted at a job subtree to report paths relative to the
/// whole golden directory.
pub fn diff_trees(
    gold_base: &Path,
    test_base: &Path,
    gold_root: &Path,
    options: &DiffOptions,
) -> TreeDiff {
    let mut diff = TreeDiff::new();

    // Golden walk: classify matches, mismatches and missing files.
    for (gold_dir, files) in walk(gold_base) {
        let rel_from_base = rel_text(&gold_dir, gold_base);
        let test_dir = join(test_base, &rel_from_base);
        let rel_dir = rel_text(&gold_dir, gold_root);

        for name in files {
            let rel_path = join_rel(&rel_dir, &name);
            let gold_path = gold_dir.join(&name);
            let test_path = test_dir.join(&name);

            let gold_bytes = match fs::read(&gold_path) {
                Ok(bytes) => bytes,
                Err(_) => {
                    diff.missing.push(rel_path);
                    continue;
                }
            };
            let test_bytes = match fs::read(&test_path) {
                Ok(bytes) => bytes,
                Err(_) => {
                    diff.missing.push(rel_path);
                    continue;
                }
            };

            if gold_bytes == test_bytes {
                diff.matches.push(rel_path);
            } else if options.is_archive(&rel_path)
                && archives_match(&gold_path, &test_path, options.tolerance)
            {
                diff.matches.push(rel_path);
            } else {
                diff.mismatches.push(rel_path);
            }
        }
    }

    // Test walk: anything without a golden counterpart is extra.
    for (test_dir, files) in walk(test_base) {
        let rel_from_base = rel_text(&test_dir, test_base);
        let gold_dir = join(gold_base, &rel_from_base);
        let rel_dir = rel_text(&gold_dir, gold_root);

        for name in files {
            if !gold_dir.join(&name).exists() {
                diff.extra.push(join_rel(&rel_dir, &name));
            }
        }
    }

    diff
}

/// Recursively collect (directory, sorted file names) pairs.
///
/// Directory entries are sorted so reported order is deterministic across
/// platforms. A nonexistent base yields nothing.
fn walk(base: &Path) -> Vec<(PathBuf, Vec<String>)> {
    let mut result = Vec::new();
    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else {
                files.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        files.sort();
        subdirs.sort();
        if !files.is_empty() {
            result.push((dir, files));
        }
        // Reverse keeps pop order equal to sorted order.
        pending.extend(subdirs.into_iter().rev());
    }
    result
}

fn rel_text(full: &Path, base: &Path) -> String {
    match full.strip_prefix(base) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => full.to_string_lossy().replace('\\', "/"),
    }
}

fn join(base: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

fn join_rel(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
