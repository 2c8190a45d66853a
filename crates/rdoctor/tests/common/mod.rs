//! Helpers shared by the signal relay test binaries.
//!
//! Each relayed signal gets its own binary: the signal is raised against the
//! whole test process.

use std::time::Duration;

use nix::sys::signal::{Signal, raise};
use rdoctor::subprocess::Supervisor;
use tokio::sync::mpsc;

/// Run `sleep 30` under supervision, raise `signal` against this process and
/// return the child's exit code with the number of terminal records seen.
pub async fn relay_to_sleeping_child(signal: Signal) -> (i32, usize) {
    let (tx, mut rx) = mpsc::channel(64);
    let command = vec!["sleep".to_string(), "30".to_string()];
    let child = Supervisor::spawn(&command, tx).unwrap();

    raise(signal).unwrap();

    let code = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("child should die from the relayed signal");

    let mut terminals = 0;
    while let Some(line) = rx.recv().await {
        if line.terminal {
            terminals += 1;
        }
    }
    (code, terminals)
}
