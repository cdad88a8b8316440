//! The resolver boundary: whatever actually tries an upgrade.

use std::collections::BTreeSet;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::types::{ResolverResult, ResolverStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long to wait for a killed child to be reaped.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);
/// How long output readers may run once the child is gone. Descendants that
/// inherited the pipes can keep them open indefinitely.
const CAPTURE_JOIN_TIMEOUT: Duration = Duration::from_millis(500);
/// Per-stream cap on captured output.
const MAX_CAPTURE_BYTES: u64 = 1024 * 1024;

/// Runs one resolver command with a timeout.
///
/// Command failures and timeouts are results, not errors. Errors are
/// reserved for problems that make every further attempt pointless, such as
/// a missing executable.
pub trait Resolver: Send + Sync {
    fn run(&self, command: &[String], timeout: Duration) -> Result<ResolverResult, PlannerError>;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn run(&self, command: &[String], timeout: Duration) -> Result<ResolverResult, PlannerError> {
        (**self).run(command, timeout)
    }
}

/// Spawns the command as a child process.
#[derive(Clone, Debug, Default)]
pub struct CommandResolver;

impl CommandResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for CommandResolver {
    fn run(&self, command: &[String], timeout: Duration) -> Result<ResolverResult, PlannerError> {
        let Some((program, args)) = command.split_first() else {
            return Err(PlannerError::InvalidConfig("empty resolver command".into()));
        };
        let started = Instant::now();
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlannerError::ResolverMissing {
                    program: program.clone(),
                });
            }
            Err(e) => return Err(PlannerError::Io(e)),
        };
        debug!(command = %command.join(" "), pid = child.id(), "resolver started");

        let stdout = capture(child.stdout.take());
        let stderr = capture(child.stderr.take());

        let deadline = started + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {}
                Err(e) => {
                    kill_and_reap(&mut child);
                    return Err(PlannerError::Io(e));
                }
            }
            if Instant::now() >= deadline {
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let (status, timed_out) = match status {
            Some(status) => (Some(status), false),
            None => {
                warn!(command = %command.join(" "), timeout_secs = timeout.as_secs_f64(), "resolver timed out");
                (kill_and_reap(&mut child), true)
            }
        };
        // Close our handle before joining the readers.
        drop(child);
        let join_deadline = Instant::now() + CAPTURE_JOIN_TIMEOUT;
        let stdout = join_capture(stdout, join_deadline);
        let stderr = join_capture(stderr, join_deadline);

        let result = ResolverResult {
            status: match status {
                Some(s) if s.success() && !timed_out => ResolverStatus::Success,
                _ => ResolverStatus::Failure,
            },
            command: command.to_vec(),
            returncode: if timed_out { None } else { status.and_then(|s| s.code()) },
            duration: started.elapsed().as_secs_f64(),
            stdout,
            stderr,
            reason: if timed_out {
                Some("timeout".to_string())
            } else {
                None
            },
        };
        if result.status == ResolverStatus::Failure && !timed_out {
            warn!(
                command = %result.command_line(),
                returncode = ?result.returncode,
                "resolver failed"
            );
        }
        Ok(result)
    }
}

fn capture<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = (&mut pipe).take(MAX_CAPTURE_BYTES).read_to_end(&mut buf);
            // Keep draining so a chatty child never blocks on a full pipe.
            let _ = std::io::copy(&mut pipe, &mut std::io::sink());
            buf
        })
    })
}

/// Join a reader, abandoning it if a surviving descendant still holds the
/// pipe open at `deadline`. An abandoned reader exits once the pipe closes.
fn join_capture(handle: Option<JoinHandle<Vec<u8>>>, deadline: Instant) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            debug!("abandoning output reader held open by a descendant process");
            return String::new();
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    handle
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Kill the child and poll until it is reaped or the reap window closes.
fn kill_and_reap(child: &mut Child) -> Option<ExitStatus> {
    let _ = child.kill();
    let deadline = Instant::now() + REAP_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
            Ok(None) | Err(_) => return None,
        }
    }
}

/// Scripted resolver for tests and dry runs. Records every command it sees.
///
/// A command "targets" a package when any argument equals the package name
/// or starts with `<package>==`.
pub struct SimulatedResolver {
    failing: BTreeSet<String>,
    timing_out: BTreeSet<String>,
    missing: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl SimulatedResolver {
    pub fn passing() -> Self {
        Self {
            failing: BTreeSet::new(),
            timing_out: BTreeSet::new(),
            missing: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation reports a missing executable.
    pub fn missing_executable() -> Self {
        Self {
            missing: true,
            ..Self::passing()
        }
    }

    pub fn with_failure(mut self, package: impl Into<String>) -> Self {
        self.failing.insert(package.into());
        self
    }

    pub fn with_timeout(mut self, package: impl Into<String>) -> Self {
        self.timing_out.insert(package.into());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn targets(set: &BTreeSet<String>, command: &[String]) -> bool {
        set.iter().any(|pkg| {
            let pinned = format!("{pkg}==");
            command.iter().any(|arg| arg == pkg || arg.starts_with(&pinned))
        })
    }
}

impl Resolver for SimulatedResolver {
    fn run(&self, command: &[String], _timeout: Duration) -> Result<ResolverResult, PlannerError> {
        if self.missing {
            return Err(PlannerError::ResolverMissing {
                program: command.first().cloned().unwrap_or_default(),
            });
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.to_vec());
        }

        let (status, returncode, reason, stderr) = if Self::targets(&self.timing_out, command) {
            (ResolverStatus::Failure, None, Some("timeout".to_string()), String::new())
        } else if Self::targets(&self.failing, command) {
            (
                ResolverStatus::Failure,
                Some(1),
                None,
                "No solution found when resolving dependencies".to_string(),
            )
        } else {
            (ResolverStatus::Success, Some(0), None, String::new())
        };
        Ok(ResolverResult {
            status,
            command: command.to_vec(),
            returncode,
            duration: 0.0,
            stdout: String::new(),
            stderr,
            reason,
        })
    }
}
