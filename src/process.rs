//! Blocking external-process execution with a wall-clock timeout.
//!
//! Output of both streams is captured line by line on reader threads while
//! the caller polls the child. On timeout the child receives SIGTERM, gets a
//! short grace period, then is killed. The timeout covers draining the
//! output too, so a call never outlives its deadline by more than the grace
//! period.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Least time given to drain output after an exit close to the deadline.
const MIN_DRAIN: Duration = Duration::from_millis(100);

/// Time between SIGTERM and SIGKILL for a timed-out child.
#[cfg_attr(not(unix), allow(dead_code))]
const TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// Errors launching or waiting on a process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("executable not found: {}", program.display())]
    NotFound { program: PathBuf },

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting on process: {0}")]
    Wait(#[from] io::Error),
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exited on its own (code may be absent if killed by a signal)
    Exited(ExitStatus),
    /// Exceeded the timeout and was terminated
    TimedOut,
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub completion: Completion,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// True only for a zero exit within the timeout.
    pub fn success(&self) -> bool {
        matches!(self.completion, Completion::Exited(status) if status.success())
    }

    pub fn timed_out(&self) -> bool {
        self.completion == Completion::TimedOut
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.completion {
            Completion::Exited(status) => status.code(),
            Completion::TimedOut => None,
        }
    }

    /// Terminating signal name, if the process was killed by one.
    pub fn term_signal(&self) -> Option<String> {
        match self.completion {
            Completion::Exited(status) if status.code().is_none() => {
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    status.signal().map(|s| format!("SIG{}", s))
                }
                #[cfg(not(unix))]
                {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Run `program` with `args`, waiting at most `timeout`.
pub fn run_with_timeout(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProcessError::NotFound {
                    program: program.to_path_buf(),
                }
            } else {
                ProcessError::Spawn {
                    program: program.to_path_buf(),
                    source,
                }
            }
        })?;

    let stdout = Arc::new(Mutex::new(String::new()));
    let stderr = Arc::new(Mutex::new(String::new()));

    // Readers hold a sender each; the channel disconnects once both streams
    // hit EOF.
    let (open_tx, open_rx) = channel::bounded::<()>(0);
    if let Some(stream) = child.stdout.take() {
        spawn_reader(stream, Arc::clone(&stdout), open_tx.clone());
    }
    if let Some(stream) = child.stderr.take() {
        spawn_reader(stream, Arc::clone(&stderr), open_tx.clone());
    }
    drop(open_tx);

    let deadline = start + timeout;
    let completion = loop {
        let polled = match child.try_wait() {
            Ok(polled) => polled,
            Err(e) => {
                let _ = terminate_child(&mut child);
                return Err(ProcessError::Wait(e));
            }
        };
        match polled {
            Some(status) => break Completion::Exited(status),
            None if Instant::now() >= deadline => {
                terminate_child(&mut child)?;
                break Completion::TimedOut;
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    // A descendant can keep the pipes open after the child exits. The
    // streams get until the same deadline; readers still blocked after that
    // are left detached.
    let drain_until = deadline.max(Instant::now() + MIN_DRAIN);
    let completion = match completion {
        Completion::Exited(_) if !streams_closed(&open_rx, drain_until) => {
            tracing::warn!(
                program = %program.display(),
                "process exited but its output stayed open past the timeout"
            );
            Completion::TimedOut
        }
        other => other,
    };

    Ok(ProcessOutput {
        completion,
        stdout: snapshot(&stdout),
        stderr: snapshot(&stderr),
        duration: start.elapsed(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: R,
    sink: Arc<Mutex<String>>,
    open: Sender<()>,
) {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            if let Ok(mut buf) = sink.lock() {
                buf.push_str(&line);
                buf.push('\n');
            }
        }
        drop(open);
    });
}

/// Wait until every reader has seen EOF, or `deadline` passes.
fn streams_closed(open: &Receiver<()>, deadline: Instant) -> bool {
    loop {
        match open.recv_deadline(deadline) {
            Ok(()) => continue,
            Err(RecvTimeoutError::Disconnected) => return true,
            Err(RecvTimeoutError::Timeout) => return false,
        }
    }
}

fn snapshot(buf: &Arc<Mutex<String>>) -> String {
    buf.lock().map(|s| s.clone()).unwrap_or_default()
}

/// Terminate a child process gracefully then forcefully.
fn terminate_child(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(child.id() as i32);
        let _ = signal::kill(pid, Signal::SIGTERM);

        let start = Instant::now();
        while start.elapsed() < TERMINATION_GRACE {
            if child.try_wait()?.is_some() {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    let _ = child.kill();
    let _ = child.wait();
    Ok(())
}
