//! Relay of termination signals to the child process.
//!
//! Handlers are installed before the child is spawned. The child's pid is
//! published through a `watch` channel: `None` before spawn and after reaping,
//! so a signal is never sent to a pid that no longer belongs to the child.

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[cfg(unix)]
pub use unix::SignalRelay;

#[cfg(not(unix))]
pub use fallback::SignalRelay;

/// Publishes the child's pid to the relay task.
pub type PidSender = watch::Sender<Option<u32>>;

/// Create the pid channel the relay reads from.
pub fn pid_channel() -> (PidSender, watch::Receiver<Option<u32>>) {
    watch::channel(None)
}

#[cfg(unix)]
mod unix {
    use super::{JoinHandle, watch};
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    use tokio::signal::unix::{SignalKind, signal};
    use tracing::{debug, info, warn};

    /// Registered SIGINT, SIGTERM and SIGHUP streams.
    pub struct SignalRelay {
        interrupt: tokio::signal::unix::Signal,
        terminate: tokio::signal::unix::Signal,
        hangup: tokio::signal::unix::Signal,
    }

    impl SignalRelay {
        /// Install handlers; from here on these signals no longer terminate
        /// this process.
        pub fn register() -> std::io::Result<Self> {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                hangup: signal(SignalKind::hangup())?,
            })
        }

        /// Relay signals until `pid` is dropped by the supervisor.
        pub fn spawn(self, pid: watch::Receiver<Option<u32>>) -> JoinHandle<()> {
            tokio::spawn(self.run(pid))
        }

        async fn run(mut self, mut pid: watch::Receiver<Option<u32>>) {
            loop {
                let received = tokio::select! {
                    _ = self.interrupt.recv() => Signal::SIGINT,
                    _ = self.terminate.recv() => Signal::SIGTERM,
                    _ = self.hangup.recv() => Signal::SIGHUP,
                    changed = pid.changed() => {
                        if changed.is_err() {
                            debug!("Signal relay stopped");
                            return;
                        }
                        continue;
                    }
                };
                let target = *pid.borrow();
                forward(received, target);
            }
        }
    }

    fn forward(signal: Signal, target: Option<u32>) {
        let Some(raw) = target.and_then(|pid| i32::try_from(pid).ok()) else {
            debug!(%signal, "No running child, signal not relayed");
            return;
        };
        match kill(Pid::from_raw(raw), signal) {
            Ok(()) => info!(%signal, pid = raw, "Relayed signal to child"),
            Err(e) => warn!(%signal, pid = raw, error = %e, "Could not relay signal"),
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    use super::{JoinHandle, watch};

    /// Console control events reach the child directly; nothing to relay.
    pub struct SignalRelay;

    impl SignalRelay {
        pub fn register() -> std::io::Result<Self> {
            Ok(Self)
        }

        pub fn spawn(self, mut pid: watch::Receiver<Option<u32>>) -> JoinHandle<()> {
            tokio::spawn(async move { while pid.changed().await.is_ok() {} })
        }
    }
}
