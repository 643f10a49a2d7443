//! Process spawning abstraction.
//!
//! The scheduler talks to children through the `ProcessSpawner` and
//! `ChildProcess` traits so pool behavior is testable without real
//! processes. The real implementation wraps `std::process` with piped
//! output drained on reader threads; the mock is scripted per job and
//! records peak concurrency.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Final state of a finished converter process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code; processes killed by a signal report -1.
    pub exit_code: i32,
    /// Captured stdout bytes.
    pub stdout: Vec<u8>,
    /// Captured stderr bytes.
    pub stderr: Vec<u8>,
}

impl ProcessOutcome {
    /// Successful outcome with the given stdout text.
    pub fn success(stdout: &str) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    /// Failed outcome with the given exit code and stderr text.
    pub fn failure(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }
}

/// A running (or scripted) child process.
pub trait ChildProcess {
    /// Non-blocking completion check.
    ///
    /// Returns the outcome exactly once, the first time the child is
    /// observed to have exited.
    fn poll(&mut self) -> io::Result<Option<ProcessOutcome>>;

    /// Block until the child exits and return its outcome.
    fn wait(&mut self) -> io::Result<ProcessOutcome>;
}

/// Spawns one child process per job.
pub trait ProcessSpawner {
    type Child: ChildProcess;

    /// Spawn `argv[0]` with the remaining elements as arguments.
    fn spawn(&self, argv: &[String]) -> io::Result<Self::Child>;
}

/// Real spawner backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSpawner;

impl RealSpawner {
    /// Create a new real spawner.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSpawner for RealSpawner {
    type Child = RealChild;

    fn spawn(&self, argv: &[String]) -> io::Result<RealChild> {
        let (exe, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut child = Command::new(exe)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain pipes on reader threads so a chatty child can't fill the
        // pipe buffer and stall before the poll loop observes its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        Ok(RealChild {
            child,
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = stream.read_to_end(&mut buffer);
        buffer
    })
}

/// A real child process with its output reader threads.
#[derive(Debug)]
pub struct RealChild {
    child: std::process::Child,
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl RealChild {
    fn collect(&mut self, status: std::process::ExitStatus) -> ProcessOutcome {
        let stdout = self
            .stdout
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        ProcessOutcome {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        }
    }
}

impl ChildProcess for RealChild {
    fn poll(&mut self) -> io::Result<Option<ProcessOutcome>> {
        match self.child.try_wait()? {
            Some(status) => Ok(Some(self.collect(status))),
            None => Ok(None),
        }
    }

    fn wait(&mut self) -> io::Result<ProcessOutcome> {
        let status = self.child.wait()?;
        Ok(self.collect(status))
    }
}

#[derive(Debug, Clone)]
struct Script {
    key: String,
    polls_before_exit: u32,
    outcome: ProcessOutcome,
    fail_spawn: bool,
}

/// Mock spawner scripted per job for scheduler tests.
///
/// Scripts are matched by substring against the spawn argv; unscripted
/// spawns succeed immediately with an empty, zero-exit outcome. The mock
/// tracks the number of concurrently live children and the peak reached.
#[derive(Debug, Default)]
pub struct MockSpawner {
    scripts: Mutex<Vec<Script>>,
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    spawned: Mutex<Vec<Vec<String>>>,
}

impl MockSpawner {
    /// Create a new mock spawner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for spawns whose argv contains `key`.
    pub fn script(&self, key: &str, outcome: ProcessOutcome) {
        self.script_with_polls(key, 0, outcome);
    }

    /// Script an outcome delivered only after `polls_before_exit` polls,
    /// keeping the child "running" across that many slot scans.
    pub fn script_with_polls(&self, key: &str, polls_before_exit: u32, outcome: ProcessOutcome) {
        self.scripts.lock().unwrap().push(Script {
            key: key.to_string(),
            polls_before_exit,
            outcome,
            fail_spawn: false,
        });
    }

    /// Make spawns whose argv contains `key` fail with NotFound.
    pub fn fail_spawn(&self, key: &str) {
        self.scripts.lock().unwrap().push(Script {
            key: key.to_string(),
            polls_before_exit: 0,
            outcome: ProcessOutcome::default(),
            fail_spawn: true,
        });
    }

    /// Peak number of concurrently live children.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Children currently live (0 after a drained run).
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Every argv passed to spawn, in spawn order.
    pub fn spawned_commands(&self) -> Vec<Vec<String>> {
        self.spawned.lock().unwrap().clone()
    }

    fn find_script(&self, argv: &[String]) -> Option<Script> {
        let scripts = self.scripts.lock().unwrap();
        scripts
            .iter()
            .find(|script| argv.iter().any(|arg| arg.contains(&script.key)))
            .cloned()
    }
}

impl ProcessSpawner for MockSpawner {
    type Child = MockChild;

    fn spawn(&self, argv: &[String]) -> io::Result<MockChild> {
        self.spawned.lock().unwrap().push(argv.to_vec());

        let script = self.find_script(argv);
        if let Some(script) = &script {
            if script.fail_spawn {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "scripted spawn failure",
                ));
            }
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);

        let (polls, outcome) = match script {
            Some(script) => (script.polls_before_exit, script.outcome),
            None => (0, ProcessOutcome::default()),
        };
        Ok(MockChild {
            remaining_polls: polls,
            outcome: Some(outcome),
            live: self.live.clone(),
        })
    }
}

/// Scripted child handed out by `MockSpawner`.
#[derive(Debug)]
pub struct MockChild {
    remaining_polls: u32,
    outcome: Option<ProcessOutcome>,
    live: Arc<AtomicUsize>,
}

impl MockChild {
    fn finish(&mut self) -> Option<ProcessOutcome> {
        let outcome = self.outcome.take();
        if outcome.is_some() {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
        outcome
    }
}

impl ChildProcess for MockChild {
    fn poll(&mut self) -> io::Result<Option<ProcessOutcome>> {
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            return Ok(None);
        }
        Ok(self.finish())
    }

    fn wait(&mut self) -> io::Result<ProcessOutcome> {
        Ok(self.finish().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    // ===========================================
    // MockSpawner
    // ===========================================

    #[test]
    fn test_mock_spawner_default_outcome() {
        let spawner = MockSpawner::new();
        let mut child = spawner.spawn(&argv(&["conv", "a", "b"])).expect("spawn");
        let outcome = child.poll().expect("poll").expect("finished");
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.is_empty());
    }

    #[test]
    fn test_mock_spawner_scripted_outcome() {
        let spawner = MockSpawner::new();
        spawner.script("duck", ProcessOutcome::failure(9, "boom"));
        let mut child = spawner
            .spawn(&argv(&["conv", "in/duck.src", "out/duck"]))
            .expect("spawn");
        let outcome = child.wait().expect("wait");
        assert_eq!(outcome.exit_code, 9);
        assert_eq!(outcome.stderr, b"boom");
    }

    #[test]
    fn test_mock_child_polls_before_exit() {
        let spawner = MockSpawner::new();
        spawner.script_with_polls("slow", 2, ProcessOutcome::success("done"));
        let mut child = spawner.spawn(&argv(&["conv", "slow"])).expect("spawn");
        assert!(child.poll().expect("poll").is_none());
        assert!(child.poll().expect("poll").is_none());
        let outcome = child.poll().expect("poll").expect("finished");
        assert_eq!(outcome.stdout, b"done");
    }

    #[test]
    fn test_mock_spawner_fail_spawn() {
        let spawner = MockSpawner::new();
        spawner.fail_spawn("missing");
        let result = spawner.spawn(&argv(&["conv", "missing"]));
        assert!(result.is_err());
        assert_eq!(spawner.live_count(), 0);
    }

    #[test]
    fn test_mock_spawner_tracks_concurrency() {
        let spawner = MockSpawner::new();
        spawner.script_with_polls("a", 5, ProcessOutcome::default());
        spawner.script_with_polls("b", 5, ProcessOutcome::default());

        let mut first = spawner.spawn(&argv(&["conv", "a"])).expect("spawn");
        let mut second = spawner.spawn(&argv(&["conv", "b"])).expect("spawn");
        assert_eq!(spawner.peak_concurrency(), 2);

        first.wait().expect("wait");
        second.wait().expect("wait");
        assert_eq!(spawner.live_count(), 0);
        assert_eq!(spawner.peak_concurrency(), 2);
    }

    #[test]
    fn test_mock_spawner_records_commands() {
        let spawner = MockSpawner::new();
        spawner.spawn(&argv(&["conv", "x", "y"])).expect("spawn");
        let commands = spawner.spawned_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0], argv(&["conv", "x", "y"]));
    }

    #[test]
    fn test_outcome_delivered_exactly_once() {
        let spawner = MockSpawner::new();
        let mut child = spawner.spawn(&argv(&["conv"])).expect("spawn");
        assert!(child.poll().expect("poll").is_some());
        assert!(child.poll().expect("poll").is_none());
        assert_eq!(spawner.live_count(), 0);
    }

    // ===========================================
    // RealSpawner
    // ===========================================

    #[cfg(unix)]
    #[test]
    fn test_real_spawner_captures_output() {
        let spawner = RealSpawner::new();
        let mut child = spawner
            .spawn(&argv(&["/bin/sh", "-c", "printf hello; printf err >&2"]))
            .expect("spawn sh");
        let outcome = child.wait().expect("wait");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, b"hello");
        assert_eq!(outcome.stderr, b"err");
    }

    #[cfg(unix)]
    #[test]
    fn test_real_spawner_nonzero_exit() {
        let spawner = RealSpawner::new();
        let mut child = spawner
            .spawn(&argv(&["/bin/sh", "-c", "exit 3"]))
            .expect("spawn sh");
        let outcome = child.wait().expect("wait");
        assert_eq!(outcome.exit_code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_spawner_poll_eventually_completes() {
        let spawner = RealSpawner::new();
        let mut child = spawner
            .spawn(&argv(&["/bin/sh", "-c", "printf ok"]))
            .expect("spawn sh");
        let outcome = loop {
            if let Some(outcome) = child.poll().expect("poll") {
                break outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        };
        assert_eq!(outcome.stdout, b"ok");
    }

    #[test]
    fn test_real_spawner_missing_exe_errors() {
        let spawner = RealSpawner::new();
        let result = spawner.spawn(&argv(&["/nonexistent/converter-xyz"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_real_spawner_empty_command_errors() {
        let spawner = RealSpawner::new();
        let result = spawner.spawn(&[]);
        assert!(result.is_err());
    }
}
