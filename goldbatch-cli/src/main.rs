//! goldbatch binary.
//!
//! Entry point for the `goldbatch` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use goldbatch_cli::exit::{codes, run_exit_code};
use goldbatch_cli::{execute_clean, execute_run, Cli, Command};
use goldbatch_log::StderrLogger;
use goldbatch_pool::{RealSleeper, RealSpawner};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let logger = StderrLogger::new(!args.no_color);
            let spawner = RealSpawner::new();
            let sleeper = RealSleeper::new();
            match execute_run(&args, &spawner, &sleeper, &logger) {
                Ok(outcome) => {
                    ExitCode::from(run_exit_code(outcome.jobs_failed, outcome.diffs_found))
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                    ExitCode::from(codes::FATAL)
                }
            }
        }
        Command::Clean(args) => {
            let logger = StderrLogger::new(!args.no_color);
            let sleeper = RealSleeper::new();
            match execute_clean(&args, &sleeper, &logger) {
                Ok(()) => ExitCode::from(codes::SUCCESS),
                Err(err) => {
                    eprintln!("error: {}", err);
                    ExitCode::from(codes::FATAL)
                }
            }
        }
    }
}
