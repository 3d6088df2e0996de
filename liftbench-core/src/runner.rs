//! Process runner
//!
//! Spawns one external command, enforces a wall-clock deadline, and captures
//! its output. The child gets its own process group so that a timeout also
//! reaches the helpers it forked.

use crate::probe::{MemoryProbe, SysinfoProbe};
use crate::sampler::{DEFAULT_STOP_GRACE, MemorySample, MemorySampler};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Exit code reported when the program does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code reported when the program is not executable.
pub const EXIT_PERMISSION_DENIED: i32 = 126;
/// Exit code reported for any other spawn failure.
pub const EXIT_SPAWN_FAILED: i32 = 1;
/// Exit code reported for a run killed at its deadline.
pub const EXIT_TIMED_OUT: i32 = -1;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const DEFAULT_TERM_GRACE: Duration = Duration::from_millis(500);

/// Outcome of one external process invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Wall-clock seconds from spawn to exit (the timeout on a timed-out run)
    pub elapsed_sec: f64,
    /// Exit code, `128 + signal` for signal deaths, -1 on timeout
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Whether the deadline was hit
    pub timed_out: bool,
}

impl ExecutionResult {
    /// True when the process exited with code 0 before its deadline.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Short human-readable failure description, `None` on success.
    ///
    /// Timeouts render as `Timeout after N seconds`; other failures carry the
    /// captured stderr truncated to `max_len` characters.
    pub fn failure_reason(&self, max_len: usize) -> Option<String> {
        if self.timed_out {
            return Some(format!("Timeout after {} seconds", format_seconds(self.elapsed_sec)));
        }
        if self.exit_code == 0 {
            return None;
        }
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            Some(format!("Command failed with exit code {}", self.exit_code))
        } else {
            Some(truncate_chars(stderr, max_len).to_string())
        }
    }

    fn spawn_failure(exit_code: i32, stderr: String) -> Self {
        Self {
            elapsed_sec: 0.0,
            exit_code,
            stdout: String::new(),
            stderr,
            timed_out: false,
        }
    }
}

/// Render a duration in seconds: whole values without decimals, others
/// with one (`600`, `0.5`).
pub fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        format!("{secs:.1}")
    }
}

/// Truncate `s` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Runs external commands under a deadline.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    term_grace: Duration,
    sampler_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Runner with default grace periods.
    pub fn new() -> Self {
        Self {
            term_grace: DEFAULT_TERM_GRACE,
            sampler_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Time between SIGTERM and SIGKILL when a deadline is hit.
    pub fn with_term_grace(mut self, grace: Duration) -> Self {
        self.term_grace = grace;
        self
    }

    /// Bound on waiting for the sampler thread after the child exits.
    pub fn with_sampler_grace(mut self, grace: Duration) -> Self {
        self.sampler_grace = grace;
        self
    }

    /// Run `argv` to completion or until `timeout` elapses.
    pub fn run(&self, argv: &[String], timeout: Duration) -> ExecutionResult {
        self.execute(argv, timeout, None).0
    }

    /// Run `argv` while sampling the memory of its process tree every `interval`.
    pub fn run_profiled(
        &self,
        argv: &[String],
        timeout: Duration,
        interval: Duration,
    ) -> (ExecutionResult, Vec<MemorySample>) {
        self.run_profiled_with(argv, timeout, interval, SysinfoProbe::new())
    }

    /// Like [`run_profiled`](Self::run_profiled) with a caller-supplied probe.
    pub fn run_profiled_with<P>(
        &self,
        argv: &[String],
        timeout: Duration,
        interval: Duration,
        probe: P,
    ) -> (ExecutionResult, Vec<MemorySample>)
    where
        P: MemoryProbe + 'static,
    {
        let probe: Box<dyn MemoryProbe> = Box::new(probe);
        self.execute(argv, timeout, Some((interval, probe)))
    }

    fn execute(
        &self,
        argv: &[String],
        timeout: Duration,
        sampling: Option<(Duration, Box<dyn MemoryProbe>)>,
    ) -> (ExecutionResult, Vec<MemorySample>) {
        let Some((program, args)) = argv.split_first() else {
            return (
                ExecutionResult::spawn_failure(EXIT_SPAWN_FAILED, "empty command".to_string()),
                Vec::new(),
            );
        };

        let (stdout_file, stderr_file) = match (tempfile::tempfile(), tempfile::tempfile()) {
            (Ok(out), Ok(err)) => (out, err),
            (Err(e), _) | (_, Err(e)) => {
                return (
                    ExecutionResult::spawn_failure(
                        EXIT_SPAWN_FAILED,
                        format!("failed to create capture files: {e}"),
                    ),
                    Vec::new(),
                );
            }
        };

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        match (stdout_file.try_clone(), stderr_file.try_clone()) {
            (Ok(out), Ok(err)) => {
                command.stdout(Stdio::from(out)).stderr(Stdio::from(err));
            }
            (Err(e), _) | (_, Err(e)) => {
                return (
                    ExecutionResult::spawn_failure(
                        EXIT_SPAWN_FAILED,
                        format!("failed to redirect output: {e}"),
                    ),
                    Vec::new(),
                );
            }
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        debug!("spawning {}", argv.join(" "));
        let started = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let exit_code = match e.kind() {
                    std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                    std::io::ErrorKind::PermissionDenied => EXIT_PERMISSION_DENIED,
                    _ => EXIT_SPAWN_FAILED,
                };
                warn!("failed to spawn {}: {}", program, e);
                return (
                    ExecutionResult::spawn_failure(
                        exit_code,
                        format!("failed to spawn {program}: {e}"),
                    ),
                    Vec::new(),
                );
            }
        };
        // Release our copies so only the child holds the write ends.
        drop(command);

        let sampler = sampling.map(|(interval, probe)| {
            MemorySampler::start_with(child.id(), interval, started, BoxedProbe(probe))
                .with_grace(self.sampler_grace)
        });

        // A deadline past what Instant can represent means no deadline.
        let deadline = started.checked_add(timeout);
        let status = wait_with_deadline(&mut child, deadline);
        let timed_out = status.is_none();
        let status = match status {
            Some(status) => Some(status),
            None => {
                warn!(
                    "{} exceeded {:.1}s deadline, terminating process group",
                    program,
                    timeout.as_secs_f64()
                );
                self.terminate(&mut child)
            }
        };

        let elapsed_sec = if timed_out {
            timeout.as_secs_f64()
        } else {
            started.elapsed().as_secs_f64()
        };
        let samples = sampler.map(MemorySampler::stop).unwrap_or_default();

        let exit_code = if timed_out {
            EXIT_TIMED_OUT
        } else {
            status.map(exit_code_of).unwrap_or(EXIT_SPAWN_FAILED)
        };

        let result = ExecutionResult {
            elapsed_sec,
            exit_code,
            stdout: read_capture(stdout_file),
            stderr: read_capture(stderr_file),
            timed_out,
        };
        debug!(
            exit_code = result.exit_code,
            elapsed_sec = result.elapsed_sec,
            samples = samples.len(),
            "process finished"
        );
        (result, samples)
    }

    /// SIGTERM the group, wait out the grace period, then SIGKILL and reap.
    fn terminate(&self, child: &mut Child) -> Option<ExitStatus> {
        signal_group(child, Signal::Terminate);
        let grace_deadline = Instant::now().checked_add(self.term_grace);
        if let Some(status) = wait_with_deadline(child, grace_deadline) {
            // The leader is gone; make sure no descendant outlives it.
            signal_group(child, Signal::Kill);
            return Some(status);
        }
        signal_group(child, Signal::Kill);
        let _ = child.kill();
        child.wait().ok()
    }
}

/// Forwards to a boxed probe so the sampler can stay generic.
struct BoxedProbe(Box<dyn MemoryProbe>);

impl MemoryProbe for BoxedProbe {
    fn read_tree(&mut self, pid: u32) -> Option<crate::MemoryReading> {
        self.0.read_tree(pid)
    }
}

/// Poll the child until it exits or `deadline` passes.
fn wait_with_deadline(child: &mut Child, deadline: Option<Instant>) -> Option<ExitStatus> {
    let Some(deadline) = deadline else {
        return child.wait().ok();
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => {
                warn!("failed to poll child {}: {}", child.id(), e);
                return child.wait().ok();
            }
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: Signal) {
    let signo = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    // The child was spawned with process_group(0), so its pid is the pgid.
    let ret = unsafe { libc::killpg(child.id() as libc::pid_t, signo) };
    if ret == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("failed to signal process group {}: {}", child.id(), err);
        }
    }
}

#[cfg(not(unix))]
fn signal_group(child: &mut Child, _signal: Signal) {
    let _ = child.kill();
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    EXIT_SPAWN_FAILED
}

fn read_capture(mut file: File) -> String {
    let mut buf = Vec::new();
    if let Err(e) = file
        .seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut buf))
    {
        warn!("failed to read captured output: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
