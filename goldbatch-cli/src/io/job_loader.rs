//! Job-list loader.
//!
//! Parses CSV job lists of the form:
//! - `name, src/path, dst/dir[, extra args]` - one conversion job
//! - `@section[, section args]` - section header applied to following jobs
//! - lines starting with `#` are comments
//! - blank rows are skipped (they're used for organization)
//!
//! Job names must be unique across every loaded list; duplicates are a
//! hard error before any scheduling starts, since a duplicate would
//! silently overwrite another job's output.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use goldbatch_pool::Job;
use thiserror::Error;

/// Errors from job-list loading.
#[derive(Debug, Error)]
pub enum JobLoadError {
    #[error("failed to read job list \"{path}\": {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: incorrect number of section columns ({found}, expected 1 or 2) on line {line}")]
    SectionColumns {
        file: String,
        line: usize,
        found: usize,
    },

    #[error("{file}: incorrect number of columns ({found}, expected 3 or 4) on line {line}")]
    Columns {
        file: String,
        line: usize,
        found: usize,
    },

    #[error("duplicate job name(s): {0}")]
    Duplicates(String),
}

/// Load every job list, returning all jobs plus the short list names used
/// for per-list log/result file naming.
pub fn load_jobs(paths: &[PathBuf]) -> Result<(Vec<Job>, Vec<String>), JobLoadError> {
    let mut jobs = Vec::new();
    let mut names = Vec::new();
    for (list_index, path) in paths.iter().enumerate() {
        let content = fs::read_to_string(path).map_err(|source| JobLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file = path.display().to_string();
        jobs.extend(parse_jobs(&content, list_index, &file)?);
        names.push(list_stem(path));
    }
    check_unique_names(&jobs)?;
    Ok((jobs, names))
}

fn list_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse jobs from one list's content.
///
/// This is the core parsing logic, separated for testability.
pub fn parse_jobs(content: &str, list_index: usize, file: &str) -> Result<Vec<Job>, JobLoadError> {
    let mut jobs = Vec::new();
    let mut section: Option<String> = None;
    let mut section_args: Vec<String> = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let row = split_csv_row(line);
        if row.is_empty() {
            continue;
        }
        if row[0].starts_with('#') {
            continue;
        }
        if let Some(name) = row[0].strip_prefix('@') {
            if row.len() > 2 {
                return Err(JobLoadError::SectionColumns {
                    file: file.to_string(),
                    line: line_num + 1,
                    found: row.len(),
                });
            }
            section = Some(name.to_string());
            section_args = row.get(1).map(|args| split_args(args)).unwrap_or_default();
            continue;
        }
        if row.len() != 3 && row.len() != 4 {
            return Err(JobLoadError::Columns {
                file: file.to_string(),
                line: line_num + 1,
                found: row.len(),
            });
        }

        let mut args = section_args.clone();
        if let Some(extra) = row.get(3) {
            args.extend(split_args(extra));
        }
        jobs.push(Job::new(
            &row[0],
            &row[1],
            &row[2],
            args,
            list_index,
            section.clone(),
        ));
    }
    Ok(jobs)
}

fn check_unique_names(jobs: &[Job]) -> Result<(), JobLoadError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for job in jobs {
        *counts.entry(&job.name).or_insert(0) += 1;
    }
    let duplicates: Vec<&str> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(name, _)| *name)
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(JobLoadError::Duplicates(duplicates.join(", ")))
    }
}

/// Split one CSV row into trimmed fields, honoring double quotes.
///
/// Returns no fields for blank rows.
fn split_csv_row(line: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return Vec::new();
    }
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Split compound argument text into individual arguments, shell-style.
///
/// Honors single and double quotes; used for section args, per-job args
/// and the CLI `--args` flag.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if in_token {
        args.push(current);
    }
    args
}
