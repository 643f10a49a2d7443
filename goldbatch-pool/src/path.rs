//! Forward-slash path text helpers.
//!
//! Report and result text must be byte-identical across platforms and
//! working directories, so every path that lands in harness output is
//! normalized to forward slashes.

use std::path::Path;

/// Join path segments with forward slashes.
pub fn join_path<S: AsRef<str>>(base: &str, segments: &[S]) -> String {
    let mut path = base.to_string();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(segment);
    }
    path
}

/// Absolute, normalized, forward-slash form of a path.
///
/// Falls back to slash-normalizing the input as given when the absolute
/// form cannot be computed (e.g. no current directory).
pub fn norm_abspath(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    norm_slashes(&absolute.to_string_lossy())
}

/// Normalize path text to use forward slashes.
pub fn norm_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// `full` relative to `base`, forward-slash normalized.
///
/// Returns the full path unchanged when it is not under `base`.
pub fn norm_relpath(full: &Path, base: &Path) -> String {
    match full.strip_prefix(base) {
        Ok(rel) => norm_slashes(&rel.to_string_lossy()),
        Err(_) => norm_slashes(&full.to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_join_path_basic() {
        assert_eq!(join_path("a", &["b", "c"]), "a/b/c");
    }

    #[test]
    fn test_join_path_trailing_slash() {
        assert_eq!(join_path("a/", &["b"]), "a/b");
    }

    #[test]
    fn test_join_path_skips_empty_segments() {
        assert_eq!(join_path("a", &["", "b"]), "a/b");
    }

    #[test]
    fn test_join_path_empty_base() {
        assert_eq!(join_path("", &["b"]), "b");
    }

    #[test]
    fn test_norm_slashes() {
        assert_eq!(norm_slashes("a\\b\\c"), "a/b/c");
        assert_eq!(norm_slashes("a/b"), "a/b");
    }

    #[test]
    fn test_norm_abspath_is_absolute() {
        let normalized = norm_abspath(&PathBuf::from("some/rel/path"));
        assert!(normalized.ends_with("some/rel/path"));
        assert!(Path::new(&normalized).is_absolute() || normalized.starts_with('/'));
    }

    #[test]
    fn test_norm_relpath_under_base() {
        let base = PathBuf::from("/root/out");
        let full = PathBuf::from("/root/out/sub/file.txt");
        assert_eq!(norm_relpath(&full, &base), "sub/file.txt");
    }

    #[test]
    fn test_norm_relpath_outside_base() {
        let base = PathBuf::from("/root/out");
        let full = PathBuf::from("/elsewhere/file.txt");
        assert_eq!(norm_relpath(&full, &base), "/elsewhere/file.txt");
    }
}
