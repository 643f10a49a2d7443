//! Run command orchestration.
//!
//! Sequences the whole harness: load job lists, schedule conversions,
//! classify output tags, write per-list log/result files, diff against the
//! golden tree and emit summaries.

use std::fs;
use std::path::Path;
use std::time::Instant;

use goldbatch_diff::golden::summary_suffix;
use goldbatch_diff::{diff_with_golden, DiffTotals};
use goldbatch_log::{colorize, Color, Logger};
use goldbatch_pool::scheduler::DEFAULT_POLL_INTERVAL_MS;
use goldbatch_pool::{
    join_path, norm_abspath, process_count, run_jobs, PoolConfig, ProcessSpawner, ScheduleOutcome,
    Sleeper,
};
use goldbatch_tags::TagTracker;

use crate::cli::RunArgs;
use crate::io::{load_jobs, split_args, summary_line, RunSummary};

use super::{CommandError, CommandResult};

const SUMMARY_HEADER: &str = "\n------------------------------------\n-- Task Summary";
const STATS_HEADER: &str = "\n------------------------------------\n-- Message Statistics";
const DIFF_SUMMARY_HEADER: &str = "\n------------------------------------\n-- Task+Diff Summary";

/// Result of run command execution.
#[derive(Debug)]
pub struct RunOutcome {
    /// Machine-readable totals for the run.
    pub summary: RunSummary,
    /// True when at least one job failed to run.
    pub jobs_failed: bool,
    /// True when the diff step found any difference.
    pub diffs_found: bool,
}

/// Execute the run command.
pub fn execute_run<S, P, L>(
    args: &RunArgs,
    spawner: &S,
    sleeper: &P,
    logger: &L,
) -> CommandResult<RunOutcome>
where
    S: ProcessSpawner,
    P: Sleeper,
    L: Logger + ?Sized,
{
    args.validate()?;
    let colored = !args.no_color;

    let (jobs, list_names) = load_jobs(&args.lists)?;
    let count = process_count(args.processes, args.process_max, jobs.len());
    logger.status(&format!(
        "Converting {} files with {} processes.",
        jobs.len(),
        count
    ));

    let in_root = norm_abspath(&args.in_dir);
    let out_root = norm_abspath(&args.out_dir);
    let golden_root = norm_abspath(&args.golden_dir);
    // The test subtree holds everything that gets diffed; logs stay in the
    // output root so machine-dependent paths never reach the comparison.
    let test_root = join_path(&out_root, &["test"]);
    create_dir(&test_root)?;

    let config = PoolConfig {
        exe: args.exe.clone(),
        fixed_args: split_args(&args.extra_args),
        out_ext: args.normalized_out_ext(),
        in_root: in_root.clone(),
        out_root: test_root.clone(),
        process_count: count,
        poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        list_count: list_names.len(),
    };

    let start = Instant::now();
    let outcome = run_jobs(jobs, &config, spawner, sleeper, logger);
    let task_elapsed = start.elapsed().as_secs_f64();

    // Gather message tags: per-list trackers roll up into the global one.
    let list_trackers: Vec<TagTracker> = outcome
        .logs
        .iter()
        .map(|log| TagTracker::from_output(log))
        .collect();
    let mut tracker = TagTracker::new();
    for list_tracker in &list_trackers {
        tracker.merge(list_tracker);
    }

    let converted = outcome.completed().len();
    let failed = outcome.failed().len();

    logger.status("");
    logger.status_color(SUMMARY_HEADER, Color::Cyan);
    logger.status(&format!(
        "Converted {} files in {:.2}s. {} failed.{}",
        converted,
        task_elapsed,
        failed,
        tracker.summary_suffix(colored)
    ));

    write_list_files(args, &outcome, &list_trackers, &list_names, &out_root, &test_root, logger)?;

    logger.status("");
    logger.status_color(STATS_HEADER, Color::Cyan);
    logger.status(&tracker.per_tag_stats(colored));

    // Per-list diffs vs golden.
    let mut totals = DiffTotals::default();
    if !args.no_diff {
        let options = args.diff_options();
        let diff_start = Instant::now();
        for (index, list_name) in list_names.iter().enumerate() {
            logger.status(&format!(
                "{}Diffing vs golden.",
                list_header(list_name, colored)
            ));
            let job_dirs: Vec<String> = outcome
                .jobs
                .iter()
                .filter(|job| job.list_index == index)
                .map(|job| job.dst.clone())
                .collect();
            totals.add(diff_with_golden(
                Path::new(&golden_root),
                Path::new(&test_root),
                Path::new(&out_root),
                &job_dirs,
                &format!("{}_result.txt", list_name),
                &options,
                &format!("{}_diffs.txt", list_name),
                colored,
                logger,
            ));
        }
        let diff_elapsed = diff_start.elapsed().as_secs_f64();

        logger.status_color(DIFF_SUMMARY_HEADER, Color::Cyan);
        logger.status(&format!(
            "Converted {} files in {:.2}s. {} failed.{}",
            converted,
            task_elapsed,
            failed,
            tracker.summary_suffix(colored)
        ));
        logger.status(&format!(
            "Diffed in {:.2}s.{}",
            diff_elapsed,
            summary_suffix(
                colored,
                totals.matches,
                totals.mismatches,
                totals.missing,
                totals.extra
            )
        ));
    }

    let summary = RunSummary {
        converted,
        failed,
        elapsed_sec: task_elapsed,
        matches: totals.matches,
        mismatches: totals.mismatches,
        missing: totals.missing,
        extra: totals.extra,
    };

    if let Some(path) = &args.summary_out {
        write_file(path, &summary_line(&outcome.failed(), &totals))?;
    }
    if let Some(path) = &args.summary_json {
        write_file(path, &summary.to_json())?;
    }

    Ok(RunOutcome {
        jobs_failed: failed > 0,
        diffs_found: !totals.passed(),
        summary,
    })
}

/// Write the per-list log and result files, each with its stats trailer.
fn write_list_files<L: Logger + ?Sized>(
    args: &RunArgs,
    outcome: &ScheduleOutcome,
    list_trackers: &[TagTracker],
    list_names: &[String],
    out_root: &str,
    test_root: &str,
    logger: &L,
) -> CommandResult<()> {
    let colored = !args.no_color;
    for (index, list_name) in list_names.iter().enumerate() {
        let list_tracker = &list_trackers[index];
        let list_jobs = outcome
            .jobs
            .iter()
            .filter(|job| job.list_index == index)
            .count();
        let trailer = format!(
            "{}\n{}{}\nConverted {} files.{}\n",
            STATS_HEADER,
            list_tracker.per_tag_stats(false),
            SUMMARY_HEADER,
            list_jobs,
            list_tracker.summary_suffix(false)
        );

        logger.status("");
        logger.status(&format!(
            "{}Converted {} files.{}",
            list_header(list_name, colored),
            list_jobs,
            list_tracker.summary_suffix(colored)
        ));

        // Results land in the test subtree so they're included in diffs;
        // logs carry full paths and stay out of the comparison.
        let result_path = join_path(test_root, &[&format!("{}_result.txt", list_name)]);
        write_file(
            Path::new(&result_path),
            &format!("{}{}", outcome.results[index], trailer),
        )?;

        let log_path = join_path(out_root, &[&format!("{}_log.txt", list_name)]);
        logger.status(&format!("  Writing log to: {}", log_path));
        write_file(
            Path::new(&log_path),
            &format!("{}{}", outcome.logs[index], trailer),
        )?;
    }
    Ok(())
}

fn list_header(list_name: &str, colored: bool) -> String {
    let header = format!("{}: ", list_name);
    if colored {
        colorize(&header, Color::Cyan)
    } else {
        header
    }
}

fn create_dir(path: &str) -> CommandResult<()> {
    fs::create_dir_all(path).map_err(|source| CommandError::Write {
        file: path.to_string(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> CommandResult<()> {
    fs::write(path, content).map_err(|source| CommandError::Write {
        file: path.display().to_string(),
        source,
    })
}
