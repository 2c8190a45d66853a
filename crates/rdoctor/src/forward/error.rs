//! Forwarding error types.

/// Errors from connecting to or writing to the collector.
///
/// None of these are fatal: the client reports them and retries.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Collector redirected ({status}) to {location}")]
    Redirect { status: u16, location: String },

    #[error("Collector redirected ({status}) without a Location header")]
    MissingLocation { status: u16 },

    #[error("Could not read Location header '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Collector rejected the handshake, HTTP response status: {status}")]
    Handshake { status: u16 },

    #[error("Could not connect to collector: {0}")]
    Connect(String),

    #[error("Could not write to collector: {0}")]
    Send(String),
}
