//! Best-effort forwarding of captured lines to the remote collector.
//!
//! Two stages: a [`ForwardingBuffer`] that applies the drop-newest policy and
//! bounds shutdown, and a [`ReconnectingClient`] that owns the network
//! session.

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use buffer::{BufferStats, ForwardingBuffer};
pub use client::{ClientStats, ReconnectingClient};
pub use config::ForwardSettings;
pub use error::ForwardError;
pub use session::{Connector, Session, WebSocketConnector, WebSocketSession};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use rdoctor_core::CapturedLine;

/// Start both forwarding stages for `lines`.
///
/// The returned task finishes once `lines` has closed and the client has
/// stopped, or the shutdown grace period has passed.
pub fn spawn_forwarder<C: Connector>(
    connector: C,
    endpoint: String,
    settings: &ForwardSettings,
    lines: mpsc::Receiver<CapturedLine>,
) -> JoinHandle<BufferStats> {
    let (queue_tx, queue_rx) = mpsc::channel(settings.buffer_capacity);
    let (done_tx, done_rx) = oneshot::channel();

    let client = ReconnectingClient::new(connector, endpoint, settings.reconnect_delay);
    tokio::spawn(client.run(queue_rx, done_tx));

    let buffer = ForwardingBuffer::new(queue_tx, done_rx, settings.shutdown_grace);
    tokio::spawn(buffer.run(lines))
}
