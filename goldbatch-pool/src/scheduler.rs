//! Slot-based process pool scheduling.
//!
//! A fixed array of slots holds at most one running child each. Admission
//! scans slots in index order for one that is empty or whose child has
//! exited, finalizing the previous occupant before reuse; when none is
//! free the control thread sleeps a short interval and rescans. After all
//! jobs are admitted the remaining occupants are drained with blocking
//! waits. Log and result text is assembled afterward by re-iterating jobs
//! in admission order, so report text is deterministic regardless of
//! completion order.

use std::io;

use goldbatch_log::{Color, Logger};
use goldbatch_tags::{colorize_output, has_error_line};

use crate::job::Job;
use crate::path::join_path;
use crate::sleeper::Sleeper;
use crate::spawner::{ChildProcess, ProcessOutcome, ProcessSpawner};

/// Default sleep between slot scans.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Converter flag suppressing usage text on argument errors.
const NO_USAGE_FLAG: &str = "--nousage";

/// Scheduler configuration for one run.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Converter executable path.
    pub exe: String,
    /// Arguments applied to every job, before per-job arguments.
    pub fixed_args: Vec<String>,
    /// Extension appended to the job name for the output file ("" for none).
    pub out_ext: String,
    /// Input root; job sources are relative to this.
    pub in_root: String,
    /// Output root; job destinations are relative to this.
    pub out_root: String,
    /// Number of pool slots.
    pub process_count: usize,
    /// Sleep between slot scans.
    pub poll_interval_ms: u64,
    /// Number of originating job lists (sizes the log/result vectors).
    pub list_count: usize,
}

/// Choose the pool size for a run.
///
/// A `requested` of 0 uses the hardware parallelism; a `process_max` of 0
/// means unlimited (bounded only by job count). The result is always at
/// least 1.
pub fn process_count(requested: usize, process_max: usize, job_count: usize) -> usize {
    let mut count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if requested > 0 {
        count = requested;
    }
    let cap = if process_max > 0 {
        process_max.min(job_count)
    } else {
        job_count
    };
    count.min(cap).max(1)
}

/// Everything a scheduling run produced.
#[derive(Debug)]
pub struct ScheduleOutcome {
    /// All jobs, outcomes filled in, in admission order.
    pub jobs: Vec<Job>,
    /// Per-list log text (commands + raw output).
    pub logs: Vec<String>,
    /// Per-list result text (status + anonymized output), diffable.
    pub results: Vec<String>,
}

impl ScheduleOutcome {
    /// Jobs whose converter exited 0.
    pub fn completed(&self) -> Vec<&Job> {
        self.jobs.iter().filter(|job| job.succeeded).collect()
    }

    /// Jobs whose converter failed to run or exited nonzero.
    pub fn failed(&self) -> Vec<&Job> {
        self.jobs.iter().filter(|job| !job.succeeded).collect()
    }
}

struct Slot<C> {
    child: C,
    job_index: usize,
    argv: Vec<String>,
}

/// Run every job, at most `config.process_count` concurrently.
///
/// Per-job failures (spawn errors, nonzero exits) are recorded on the job
/// and never abort the run. Requires `job.list_index < config.list_count`
/// for every job.
pub fn run_jobs<S, P, L>(
    mut jobs: Vec<Job>,
    config: &PoolConfig,
    spawner: &S,
    sleeper: &P,
    logger: &L,
) -> ScheduleOutcome
where
    S: ProcessSpawner,
    P: Sleeper,
    L: Logger + ?Sized,
{
    let slot_count = config.process_count.max(1);
    let mut slots: Vec<Option<Slot<S::Child>>> = Vec::with_capacity(slot_count);
    slots.resize_with(slot_count, || None);

    // Concurrent children racing to create the same ancestor directory is
    // a known source of spurious IO errors, so create everything up front
    // on the control thread before any spawn.
    if slot_count > 1 {
        precreate_destinations(&jobs, config, logger);
    }

    let mut section: Option<String> = None;
    for index in 0..jobs.len() {
        let slot = acquire_slot(&mut slots, &mut jobs, config, sleeper, logger);

        if jobs[index].section != section {
            section = jobs[index].section.clone();
            if let Some(name) = &section {
                logger.status_color(&section_header(name), Color::Cyan);
            }
        }

        let argv = job_argv(&jobs[index], config);
        let mut spawn_argv = argv.clone();
        spawn_argv.push(NO_USAGE_FLAG.to_string());

        match spawner.spawn(&spawn_argv) {
            Ok(child) => {
                slots[slot] = Some(Slot {
                    child,
                    job_index: index,
                    argv,
                });
            }
            Err(err) => {
                let outcome = ProcessOutcome::failure(
                    -1,
                    &format!("ERROR: Failed to start process: {}", err),
                );
                finalize(&mut jobs[index], argv, outcome, logger);
            }
        }
    }

    // Drain: no new work competes for slots, so block on each remainder.
    for slot in &mut slots {
        if let Some(mut occupant) = slot.take() {
            let outcome = occupant.child.wait().unwrap_or_else(wait_error_outcome);
            finalize(&mut jobs[occupant.job_index], occupant.argv, outcome, logger);
        }
    }

    assemble(jobs, config)
}

/// Scan slots in index order until one is empty or its child has exited.
fn acquire_slot<C, P, L>(
    slots: &mut [Option<Slot<C>>],
    jobs: &mut [Job],
    config: &PoolConfig,
    sleeper: &P,
    logger: &L,
) -> usize
where
    C: ChildProcess,
    P: Sleeper,
    L: Logger + ?Sized,
{
    loop {
        for index in 0..slots.len() {
            let exited = match &mut slots[index] {
                None => return index,
                Some(occupant) => occupant
                    .child
                    .poll()
                    .unwrap_or_else(|err| Some(wait_error_outcome(err))),
            };
            if let Some(outcome) = exited {
                let occupant = slots[index].take().expect("slot occupied");
                finalize(&mut jobs[occupant.job_index], occupant.argv, outcome, logger);
                return index;
            }
        }
        sleeper.sleep_ms(config.poll_interval_ms);
    }
}

fn wait_error_outcome(err: io::Error) -> ProcessOutcome {
    ProcessOutcome::failure(-1, &format!("ERROR: Failed waiting for process: {}", err))
}

fn job_argv(job: &Job, config: &PoolConfig) -> Vec<String> {
    let in_path = join_path(&config.in_root, &[&job.src]);
    let out_name = format!("{}{}", job.name, config.out_ext);
    let out_path = join_path(&config.out_root, &[&job.dst, &out_name]);

    let mut argv = vec![config.exe.clone(), in_path, out_path];
    argv.extend(config.fixed_args.iter().cloned());
    argv.extend(job.args.iter().cloned());
    argv
}

/// Record a finished process on its job and echo command + output.
fn finalize<L: Logger + ?Sized>(
    job: &mut Job,
    argv: Vec<String>,
    outcome: ProcessOutcome,
    logger: &L,
) {
    job.command = render_command(&argv);
    job.succeeded = outcome.exit_code == 0;

    let mut output = String::from_utf8_lossy(&outcome.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&outcome.stderr));
    let mut output = output.replace('\r', "");
    while output.ends_with('\n') {
        output.pop();
    }

    if !job.succeeded && !has_error_line(&output) {
        // Failure without reported errors usually means the process crashed.
        let code = outcome.exit_code;
        output.push_str(&format!("\nERROR: Exit code {} (0x{}).", code, uhex32(code)));
        if code as u32 == 0xC000_0005 {
            output.push_str(" [Access Violation]");
        }
    }
    job.output = output;

    logger.status(&format!(
        "{}{}",
        job.command,
        colorize_output(&job.format_output(None, None))
    ));
}

/// 8-hex-digit unsigned 32-bit form of an exit code.
fn uhex32(code: i32) -> String {
    format!("{:08X}", code as u32)
}

fn render_command(argv: &[String]) -> String {
    let mut command = String::new();
    for (index, arg) in argv.iter().enumerate() {
        if index > 0 {
            command.push(' ');
        }
        if arg.contains(' ') {
            command.push('"');
            command.push_str(arg);
            command.push('"');
        } else {
            command.push_str(arg);
        }
    }
    command
}

fn precreate_destinations<L: Logger + ?Sized>(jobs: &[Job], config: &PoolConfig, logger: &L) {
    for job in jobs {
        let dir = join_path(&config.out_root, &[&job.dst]);
        if let Err(err) = std::fs::create_dir_all(&dir) {
            logger.error(&format!("Failed creating directory \"{}\": {}", dir, err));
        }
    }
}

fn section_header(name: &str) -> String {
    format!("\n------------------------------------\n-- {}", name)
}

/// Assemble per-list log and result text in admission order.
fn assemble(jobs: Vec<Job>, config: &PoolConfig) -> ScheduleOutcome {
    let mut logs = vec![String::new(); config.list_count];
    let mut results = vec![String::new(); config.list_count];

    let mut section: Option<String> = None;
    for job in &jobs {
        if job.section != section {
            section = job.section.clone();
            if let Some(name) = &section {
                let header = format!("{}\n", section_header(name));
                logs[job.list_index].push_str(&header);
                results[job.list_index].push_str(&header);
            }
        }
        logs[job.list_index].push_str(&job.log_text());
        logs[job.list_index].push('\n');
        results[job.list_index].push_str(&job.result_text(&config.in_root, &config.out_root));
        results[job.list_index].push('\n');
    }

    ScheduleOutcome {
        jobs,
        logs,
        results,
    }
}
