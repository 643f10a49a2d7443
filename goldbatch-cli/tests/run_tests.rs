//! End-to-end run command tests.
//!
//! Drives `execute_run` with a scripted spawner against real temp
//! directories: job lists on disk, per-list artifacts written, diffs
//! against a golden tree, exit bits derived from the outcome.

use std::fs;
use std::path::{Path, PathBuf};

use goldbatch_cli::exit::run_exit_code;
use goldbatch_cli::{execute_run, CommandError, RunArgs};
use goldbatch_log::MockLogger;
use goldbatch_pool::{MockSleeper, MockSpawner, ProcessOutcome};

fn write_list(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write list");
    path
}

fn run_args(temp: &Path, lists: Vec<PathBuf>, out_name: &str) -> RunArgs {
    RunArgs {
        lists,
        exe: "conv".to_string(),
        extra_args: String::new(),
        in_dir: temp.join("in"),
        out_dir: temp.join(out_name),
        golden_dir: temp.join("golden"),
        out_ext: ".pack".to_string(),
        processes: 2,
        process_max: 64,
        no_diff: false,
        diff_command: None,
        archive_ext: "zip".to_string(),
        text_exts: vec![],
        tolerance: 3,
        summary_out: None,
        summary_json: None,
        no_color: true,
    }
}

#[test]
fn test_run_writes_reports_and_flags_unseeded_golden() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(
        temp.path(),
        "basic.csv",
        "duck, models/duck.src, duck\ngoose, models/goose.src, goose\n",
    );
    fs::create_dir_all(temp.path().join("golden")).expect("mkdir");

    let spawner = MockSpawner::new();
    spawner.script("duck", ProcessOutcome::success("converted duck [CONV_INFO_OK]"));
    spawner.script("goose", ProcessOutcome::success(""));

    let args = run_args(temp.path(), vec![list], "out");
    let logger = MockLogger::new();
    let outcome = execute_run(&args, &spawner, &MockSleeper::new(), &logger).expect("run");

    assert!(!outcome.jobs_failed);
    assert_eq!(outcome.summary.converted, 2);
    assert_eq!(outcome.summary.failed, 0);

    // The golden tree has no result copy yet, so the run flags it extra.
    assert!(outcome.diffs_found);
    assert_eq!(outcome.summary.extra, 1);
    assert_eq!(run_exit_code(outcome.jobs_failed, outcome.diffs_found), 2);

    let result_path = temp.path().join("out/test/basic_result.txt");
    let result = fs::read_to_string(&result_path).expect("result file");
    assert!(result.contains("Success [duck] models/duck.src --> duck"));
    assert!(result.contains("Success [goose] models/goose.src --> goose"));
    assert!(result.contains("CONV_INFO_OK(1)"));
    assert!(result.contains("Converted 2 files."));

    let log = fs::read_to_string(temp.path().join("out/basic_log.txt")).expect("log file");
    assert!(log.contains("conv "));
    assert!(log.contains("--> duck") || log.contains("/duck/duck.pack"));

    assert!(logger.contains("Converting 2 files with 2 processes."));
    assert!(logger.contains("Extra:     basic_result.txt"));
}

#[test]
fn test_run_passes_against_seeded_golden() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(temp.path(), "basic.csv", "duck, models/duck.src, duck\n");
    fs::create_dir_all(temp.path().join("golden")).expect("mkdir");

    let spawner = MockSpawner::new();
    spawner.script("duck", ProcessOutcome::success("converted [CONV_INFO_OK]"));

    // First run produces the result text; seed the golden tree with it.
    let first = run_args(temp.path(), vec![list.clone()], "out1");
    execute_run(&first, &spawner, &MockSleeper::new(), &MockLogger::new()).expect("first run");
    fs::copy(
        temp.path().join("out1/test/basic_result.txt"),
        temp.path().join("golden/basic_result.txt"),
    )
    .expect("seed golden");

    // Second run must diff clean against the seeded golden.
    let second = run_args(temp.path(), vec![list], "out2");
    let logger = MockLogger::new();
    let outcome = execute_run(&second, &spawner, &MockSleeper::new(), &logger).expect("second run");

    assert!(!outcome.jobs_failed);
    assert!(!outcome.diffs_found);
    assert_eq!(outcome.summary.matches, 1);
    assert_eq!(run_exit_code(outcome.jobs_failed, outcome.diffs_found), 0);
    assert!(logger.contains("Diff Passed: 1 same"));
}

#[test]
fn test_run_detects_result_regression() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(temp.path(), "basic.csv", "duck, models/duck.src, duck\n");
    fs::create_dir_all(temp.path().join("golden")).expect("mkdir");
    fs::write(
        temp.path().join("golden/basic_result.txt"),
        "Success [duck] models/duck.src --> duck\n    the old output\n",
    )
    .expect("seed golden");

    let spawner = MockSpawner::new();
    spawner.script("duck", ProcessOutcome::success("the new output"));

    let args = run_args(temp.path(), vec![list], "out");
    let logger = MockLogger::new();
    let outcome = execute_run(&args, &spawner, &MockSleeper::new(), &logger).expect("run");

    assert!(outcome.diffs_found);
    assert_eq!(outcome.summary.mismatches, 1);
    assert!(logger.contains("Different: basic_result.txt"));
    assert!(logger.contains("Diff FAILED:"));
}

#[test]
fn test_failed_job_sets_bit_one_and_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(
        temp.path(),
        "basic.csv",
        "good, a.src, good\nbad, b.src, bad\n",
    );

    let spawner = MockSpawner::new();
    spawner.script("bad", ProcessOutcome::failure(2, "error: kaput"));

    let mut args = run_args(temp.path(), vec![list], "out");
    args.no_diff = true;
    args.summary_out = Some(temp.path().join("summary.txt"));
    args.summary_json = Some(temp.path().join("summary.json"));

    let outcome =
        execute_run(&args, &spawner, &MockSleeper::new(), &MockLogger::new()).expect("run");

    assert!(outcome.jobs_failed);
    assert!(!outcome.diffs_found);
    assert_eq!(run_exit_code(outcome.jobs_failed, outcome.diffs_found), 1);
    assert_eq!(outcome.summary.converted, 1);
    assert_eq!(outcome.summary.failed, 1);

    let summary = fs::read_to_string(temp.path().join("summary.txt")).expect("summary");
    assert_eq!(summary, "Failed converting 1 file(s) (bad).");

    let json = fs::read_to_string(temp.path().join("summary.json")).expect("summary json");
    let parsed = goldbatch_cli::io::RunSummary::from_json(&json).expect("parse");
    assert_eq!(parsed.failed, 1);
    assert_eq!(parsed.converted, 1);

    // The result file records the failure status word.
    let result =
        fs::read_to_string(temp.path().join("out/test/basic_result.txt")).expect("result");
    assert!(result.contains("FAILURE [bad]"));
    assert!(result.contains("error: kaput"));
    assert!(result.contains(" 1 error."));
}

#[test]
fn test_duplicate_job_names_abort_before_scheduling() {
    let temp = tempfile::tempdir().expect("tempdir");
    let first = write_list(temp.path(), "a.csv", "duck, a.src, duck\n");
    let second = write_list(temp.path(), "b.csv", "duck, b.src, duck2\n");

    let spawner = MockSpawner::new();
    let args = run_args(temp.path(), vec![first, second], "out");
    let result = execute_run(&args, &spawner, &MockSleeper::new(), &MockLogger::new());

    assert!(matches!(result, Err(CommandError::Load(_))));
    // Nothing was scheduled.
    assert!(spawner.spawned_commands().is_empty());
}

#[test]
fn test_section_args_and_usage_flag_reach_spawn() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(
        temp.path(),
        "basic.csv",
        "@Fast, --fast\nduck, models/duck.src, duck\n",
    );

    let spawner = MockSpawner::new();
    let mut args = run_args(temp.path(), vec![list], "out");
    args.extra_args = "--global".to_string();
    args.no_diff = true;

    execute_run(&args, &spawner, &MockSleeper::new(), &MockLogger::new()).expect("run");

    let commands = spawner.spawned_commands();
    assert_eq!(commands.len(), 1);
    let argv = &commands[0];
    assert_eq!(argv[0], "conv");
    assert!(argv[1].ends_with("models/duck.src"));
    assert!(argv[2].ends_with("duck/duck.pack"));
    // Fixed args come before per-job (section) args; the usage flag is last.
    let global = argv.iter().position(|a| a == "--global").expect("--global");
    let fast = argv.iter().position(|a| a == "--fast").expect("--fast");
    assert!(global < fast);
    assert_eq!(argv.last().map(String::as_str), Some("--nousage"));
}

#[test]
fn test_no_diff_skips_diff_step() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(temp.path(), "basic.csv", "duck, a.src, duck\n");

    let mut args = run_args(temp.path(), vec![list], "out");
    args.no_diff = true;

    let logger = MockLogger::new();
    let outcome = execute_run(&args, &MockSpawner::new(), &MockSleeper::new(), &logger)
        .expect("run");

    assert!(!outcome.diffs_found);
    assert_eq!(outcome.summary.matches, 0);
    assert!(!logger.contains("Diffing vs golden."));
    assert!(!logger.contains("Diff Passed"));
}

#[test]
fn test_empty_exe_is_invalid_argument() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = write_list(temp.path(), "basic.csv", "duck, a.src, duck\n");

    let mut args = run_args(temp.path(), vec![list], "out");
    args.exe = String::new();

    let result = execute_run(
        &args,
        &MockSpawner::new(),
        &MockSleeper::new(),
        &MockLogger::new(),
    );
    assert!(matches!(result, Err(CommandError::InvalidArgument(_))));
}

#[test]
fn test_multiple_lists_get_separate_artifacts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let first = write_list(temp.path(), "basic.csv", "duck, a.src, duck\n");
    let second = write_list(temp.path(), "extended.csv", "goose, b.src, goose\n");
    fs::create_dir_all(temp.path().join("golden")).expect("mkdir");

    let args = run_args(temp.path(), vec![first, second], "out");
    let outcome = execute_run(
        &args,
        &MockSpawner::new(),
        &MockSleeper::new(),
        &MockLogger::new(),
    )
    .expect("run");

    assert!(temp.path().join("out/test/basic_result.txt").exists());
    assert!(temp.path().join("out/test/extended_result.txt").exists());
    assert!(temp.path().join("out/basic_log.txt").exists());
    assert!(temp.path().join("out/extended_log.txt").exists());

    // Both unseeded result files count as extra, one per list.
    assert_eq!(outcome.summary.extra, 2);
}
