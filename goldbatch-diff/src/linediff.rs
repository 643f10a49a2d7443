//! External line-diff invocation.
//!
//! Text-format mismatches are run through an external diff command so the
//! combined diff report shows what actually changed. The command is a
//! template with `{0}` (golden path) and `{1}` (test path) placeholders;
//! when none is supplied, well-known tools are probed in priority order.
//! Having no diff tool at all is tolerated.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Find an executable in PATH.
pub fn find_exe(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        let candidate = dir.join(exe_file_name(name));
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn exe_file_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Probe for the default command used to line-diff text files.
///
/// Priority: `diff --ignore-all-space`, then git's diff. None when neither
/// tool is available.
pub fn default_diff_command() -> Option<String> {
    if let Some(exe) = find_exe("diff") {
        return Some(format!(
            "\"{}\" --ignore-all-space \"{{0}}\" \"{{1}}\"",
            exe.display()
        ));
    }
    if let Some(exe) = find_exe("git") {
        return Some(format!(
            "\"{}\" --no-pager diff --ignore-all-space --no-color \"{{0}}\" \"{{1}}\"",
            exe.display()
        ));
    }
    None
}

/// Run the diff command template against a golden/test file pair.
///
/// Returns the command line plus its combined output (a differing pair is
/// expected to exit nonzero, so exit status is ignored), or None when the
/// command could not be run at all.
pub fn run_line_diff(template: &str, gold: &Path, test: &Path) -> Option<String> {
    let command_line = template
        .replace("{0}", &gold.to_string_lossy())
        .replace("{1}", &test.to_string_lossy());

    let argv = split_command(&command_line);
    let (exe, args) = argv.split_first()?;
    let output = Command::new(exe).args(args).output().ok()?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(format!("{}\n{}\n", command_line, text.replace('\r', "\n")))
}

/// Split a command line on whitespace, honoring double quotes.
pub fn split_command(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    parts.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        parts.push(current);
    }
    parts
}
