//! Sleep abstraction for the poll loop.
//!
//! The scheduler busy-polls slot state with a short fixed sleep between
//! scans. The `Sleeper` trait keeps that wait testable: scheduler tests run
//! with a mock that returns immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Trait for sleeping between slot scans.
pub trait Sleeper: Send + Sync {
    /// Sleep for the specified number of milliseconds.
    fn sleep_ms(&self, millis: u64);
}

/// Real sleeper that uses `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSleeper;

impl RealSleeper {
    /// Create a new real sleeper.
    pub fn new() -> Self {
        Self
    }
}

impl Sleeper for RealSleeper {
    fn sleep_ms(&self, millis: u64) {
        std::thread::sleep(Duration::from_millis(millis));
    }
}

/// Mock sleeper for testing - returns immediately and counts calls.
#[derive(Debug, Default)]
pub struct MockSleeper {
    calls: AtomicU64,
}

impl MockSleeper {
    /// Create a new mock sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times sleep was requested.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Sleeper for MockSleeper {
    fn sleep_ms(&self, _millis: u64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
