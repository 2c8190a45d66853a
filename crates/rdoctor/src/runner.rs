//! Wiring of capture, supervision and forwarding for one wrapped command.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::forward::{Connector, ForwardSettings, spawn_forwarder};
use crate::subprocess::{Supervisor, SupervisorError};

/// Capacity of the merged channel feeding the forwarding buffer.
///
/// The buffer never waits on its own queue, so this rarely fills.
pub const MERGED_CAPACITY: usize = 16;

/// Run `command` to completion and return its exit code.
///
/// The forwarder starts first so it is ready before the child writes
/// anything. The call returns once the child has been reaped and the
/// forwarder has either stopped or used up its shutdown grace period.
pub async fn run<C: Connector>(
    command: &[String],
    connector: C,
    endpoint: String,
    settings: &ForwardSettings,
) -> Result<i32, SupervisorError> {
    let (lines_tx, lines_rx) = mpsc::channel(MERGED_CAPACITY);
    let forwarder = spawn_forwarder(connector, endpoint, settings, lines_rx);

    let child = Supervisor::spawn(command, lines_tx)?;
    let code = child.wait().await;

    match forwarder.await {
        Ok(stats) => debug!(
            accepted = stats.accepted,
            dropped = stats.dropped,
            client_stopped = stats.client_stopped,
            "Forwarder finished"
        ),
        Err(e) => warn!(error = %e, "Forwarder task failed"),
    }
    Ok(code)
}
