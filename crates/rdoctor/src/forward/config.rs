//! Forwarding parameters.

use std::time::Duration;

/// Queue size and timing for the forwarding stages.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    /// Records held between the capture pipeline and the client.
    pub buffer_capacity: usize,
    /// Wait between failed connection attempts.
    pub reconnect_delay: Duration,
    /// How long shutdown waits for the client to stop.
    pub shutdown_grace: Duration,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 100,
            reconnect_delay: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}
