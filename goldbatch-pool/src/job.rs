//! Conversion job records.

/// One unit of conversion work plus its outcome.
///
/// Constructed by the job-list loader, mutated exactly once by the
/// scheduler, then read-only for tag accounting, diffing and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Unique name across all loaded lists.
    pub name: String,
    /// Source path, relative to the input root.
    pub src: String,
    /// Destination directory, relative to the output root.
    pub dst: String,
    /// Extra converter arguments for this job.
    pub args: Vec<String>,
    /// Index of the originating job list.
    pub list_index: usize,
    /// Grouping label for logging and ordering only.
    pub section: Option<String>,

    /// Whether the converter exited with code 0.
    pub succeeded: bool,
    /// The resolved command line the job was invoked with.
    pub command: String,
    /// Captured stdout+stderr, CR-stripped, trailing newlines trimmed.
    pub output: String,
}

impl Job {
    /// Create a job with an empty outcome.
    pub fn new(
        name: impl Into<String>,
        src: impl Into<String>,
        dst: impl Into<String>,
        args: Vec<String>,
        list_index: usize,
        section: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            dst: dst.into(),
            args,
            list_index,
            section,
            succeeded: false,
            command: String::new(),
            output: String::new(),
        }
    }

    /// Format captured output for report text.
    ///
    /// When roots are given they are replaced with `${IN}`/`${OUT}` tokens
    /// so results compare equal across machines and build directories.
    /// Output is indented four spaces and prefixed with a newline; empty
    /// output formats as the empty string.
    pub fn format_output(&self, in_root: Option<&str>, out_root: Option<&str>) -> String {
        if self.output.is_empty() {
            return String::new();
        }
        let mut output = self.output.clone();
        if let Some(in_root) = in_root {
            output = output.replace(in_root, "${IN}");
        }
        if let Some(out_root) = out_root {
            output = output.replace(out_root, "${OUT}");
        }

        let mut formatted = String::with_capacity(output.len() + 16);
        formatted.push('\n');
        for line in output.split_inclusive('\n') {
            formatted.push_str("    ");
            formatted.push_str(line);
        }
        formatted
    }

    /// Log text: command plus raw (unanonymized) output.
    pub fn log_text(&self) -> String {
        format!("{}{}", self.command, self.format_output(None, None))
    }

    /// Result text: status word, name, src --> dst, anonymized output.
    ///
    /// This is the diffable form; it must not contain machine-dependent
    /// paths.
    pub fn result_text(&self, in_root: &str, out_root: &str) -> String {
        let prefix = if self.succeeded { "Success" } else { "FAILURE" };
        format!(
            "{} [{}] {} --> {}{}",
            prefix,
            self.name,
            self.src,
            self.dst,
            self.format_output(Some(in_root), Some(out_root))
        )
    }
}
