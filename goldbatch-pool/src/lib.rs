//! Bounded process-pool scheduling for conversion jobs.
//!
//! One external converter process per job, at most `process_count` running
//! concurrently. A single control thread owns the pool slots and all job
//! outcome state; completion is detected by polling, so no platform
//! multi-wait primitive is needed.

pub mod job;
pub mod path;
pub mod scheduler;
pub mod sleeper;
pub mod spawner;

pub use job::Job;
pub use path::{join_path, norm_abspath};
pub use scheduler::{process_count, run_jobs, PoolConfig, ScheduleOutcome};
pub use sleeper::{MockSleeper, RealSleeper, Sleeper};
pub use spawner::{
    ChildProcess, MockSpawner, ProcessOutcome, ProcessSpawner, RealSpawner,
};
