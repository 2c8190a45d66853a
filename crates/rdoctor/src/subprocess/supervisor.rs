//! Child process lifecycle: spawn, capture wiring, signal relay, reaping.

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use rdoctor_core::{CapturedLine, Origin};

use super::exit::exit_code;
use super::signals::{self, PidSender, SignalRelay};
use crate::capture::{READER_HANDOFF_CAPACITY, combine, read_lines};

/// Errors that prevent the child from running at all.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("No command given")]
    EmptyCommand,

    #[error("Could not create process '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Could not create pipe for child {stream}")]
    PipeUnavailable { stream: Origin },
}

/// Starts and supervises the wrapped command.
pub struct Supervisor;

/// A running child whose exit code resolves once both streams are drained.
pub struct SupervisedChild {
    pid: Option<u32>,
    exit: JoinHandle<i32>,
}

impl SupervisedChild {
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the child to be reaped and return its exit code.
    pub async fn wait(self) -> i32 {
        match self.exit.await {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "Exit-code task failed");
                0
            }
        }
    }
}

impl Supervisor {
    /// Spawn `command` and stream its output into `lines`.
    ///
    /// `lines` is closed after both stdout and stderr have delivered their
    /// terminal record. Signal handlers for SIGINT, SIGTERM and SIGHUP are
    /// installed before the child starts and relay to it while it runs.
    pub fn spawn(
        command: &[String],
        lines: mpsc::Sender<CapturedLine>,
    ) -> Result<SupervisedChild, SupervisorError> {
        let (program, args) = command
            .split_first()
            .ok_or(SupervisorError::EmptyCommand)?;

        let relay = match SignalRelay::register() {
            Ok(relay) => Some(relay),
            Err(e) => {
                warn!(error = %e, "Could not install signal handlers, signals will not be relayed");
                None
            }
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SupervisorError::SpawnFailed {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stdout = take_pipe(&mut child, stdout, Origin::Stdout)?;
        let stderr = child.stderr.take();
        let stderr = take_pipe(&mut child, stderr, Origin::Stderr)?;

        let pid = child.id();
        let (pid_tx, pid_rx) = signals::pid_channel();
        pid_tx.send_replace(pid);
        if let Some(relay) = relay {
            relay.spawn(pid_rx);
        }
        info!(program = %program, pid = ?pid, "Started child process");

        let (stdout_tx, stdout_rx) = mpsc::channel(READER_HANDOFF_CAPACITY);
        let (stderr_tx, stderr_rx) = mpsc::channel(READER_HANDOFF_CAPACITY);
        let stdout_reader = tokio::spawn(async move {
            let mut stdout = stdout;
            read_lines(&mut stdout, tokio::io::stdout(), Origin::Stdout, stdout_tx).await;
            stdout
        });
        let stderr_reader = tokio::spawn(async move {
            let mut stderr = stderr;
            read_lines(&mut stderr, tokio::io::stderr(), Origin::Stderr, stderr_tx).await;
            stderr
        });

        let (drained_tx, drained_rx) = oneshot::channel();
        tokio::spawn(combine(stdout_rx, stderr_rx, lines, drained_tx));

        let exit = tokio::spawn(reap(
            child,
            pid_tx,
            drained_rx,
            Pipes {
                stdout: stdout_reader,
                stderr: stderr_reader,
            },
        ));
        Ok(SupervisedChild { pid, exit })
    }
}

/// Reader tasks hand their pipe back so it outlives the child.
struct Pipes {
    stdout: JoinHandle<ChildStdout>,
    stderr: JoinHandle<ChildStderr>,
}

fn take_pipe<T>(child: &mut Child, pipe: Option<T>, stream: Origin) -> Result<T, SupervisorError> {
    pipe.ok_or_else(|| {
        let _ = child.start_kill();
        SupervisorError::PipeUnavailable { stream }
    })
}

async fn reap(
    mut child: Child,
    pid: PidSender,
    drained: oneshot::Receiver<()>,
    pipes: Pipes,
) -> i32 {
    // Both readers must see end-of-stream before the child is reaped.
    let _ = drained.await;

    let status = child.wait().await;
    pid.send_replace(None);
    drop(pid);

    let code = match status {
        Ok(status) => {
            let code = exit_code(status);
            info!(code, %status, "Child process exited");
            code
        }
        Err(e) => {
            warn!(error = %e, "Waiting for command was not successful");
            0
        }
    };

    // Pipes are released only after reaping.
    let Pipes { stdout, stderr } = pipes;
    drop((stdout.await, stderr.await));
    code
}
