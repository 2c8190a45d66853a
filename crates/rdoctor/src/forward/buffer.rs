//! Bounded drop-newest queue between the capture pipeline and the client.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use rdoctor_core::CapturedLine;

/// Counters reported when the buffer shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub accepted: u64,
    pub dropped: u64,
    /// Whether the client stopped within the grace period.
    pub client_stopped: bool,
}

/// Feeds the client's queue without ever waiting on it.
pub struct ForwardingBuffer {
    queue: mpsc::Sender<CapturedLine>,
    client_done: oneshot::Receiver<()>,
    grace: Duration,
}

impl ForwardingBuffer {
    pub const fn new(
        queue: mpsc::Sender<CapturedLine>,
        client_done: oneshot::Receiver<()>,
        grace: Duration,
    ) -> Self {
        Self {
            queue,
            client_done,
            grace,
        }
    }

    /// Move records from `lines` into the queue until `lines` closes.
    ///
    /// A record that does not fit is discarded; queued records are kept.
    /// After `lines` closes the queue is closed and the client gets at most
    /// the grace period to stop.
    pub async fn run(self, mut lines: mpsc::Receiver<CapturedLine>) -> BufferStats {
        let Self {
            queue,
            client_done,
            grace,
        } = self;
        let mut stats = BufferStats::default();

        while let Some(line) = lines.recv().await {
            match queue.try_send(line) {
                Ok(()) => stats.accepted += 1,
                Err(_) => stats.dropped += 1,
            }
        }
        drop(queue);

        // A dropped sender means the client task is already gone.
        match tokio::time::timeout(grace, client_done).await {
            Ok(_) => stats.client_stopped = true,
            Err(_) => warn!(
                grace_secs = grace.as_secs_f64(),
                "Forwarding client did not stop in time, continuing shutdown"
            ),
        }
        debug!(
            accepted = stats.accepted,
            dropped = stats.dropped,
            "Forwarding buffer closed"
        );
        stats
    }
}
