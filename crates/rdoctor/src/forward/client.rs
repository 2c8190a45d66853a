//! Reconnecting collector client.
//!
//! States: `Connecting` (attempting a session, possibly following a redirect),
//! `Disconnected` (waiting out the reconnect delay while discarding queued
//! records), `Connected` (encode and send each record) and `Draining`
//! (terminal: close the session and report completion).

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use url::Url;

use rdoctor_core::{CapturedLine, encode_line};

use super::error::ForwardError;
use super::session::{Connector, Session};

/// Redirects followed without waiting, per connect cycle.
pub const MAX_IMMEDIATE_REDIRECTS: usize = 1;

/// Counters reported when the client stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub sent: u64,
    pub discarded: u64,
    pub connects: u64,
}

enum State<S> {
    Connecting { endpoint: String, redirects: usize },
    Disconnected { endpoint: String },
    Connected(S),
    Draining(Option<S>),
}

/// Owns at most one live session to the collector at a time.
pub struct ReconnectingClient<C: Connector> {
    connector: C,
    endpoint: String,
    reconnect_delay: Duration,
    stats: ClientStats,
}

impl<C: Connector> ReconnectingClient<C> {
    pub const fn new(connector: C, endpoint: String, reconnect_delay: Duration) -> Self {
        Self {
            connector,
            endpoint,
            reconnect_delay,
            stats: ClientStats {
                sent: 0,
                discarded: 0,
                connects: 0,
            },
        }
    }

    /// Forward records from `queue` until it closes, then signal `done`.
    pub async fn run(
        mut self,
        mut queue: mpsc::Receiver<CapturedLine>,
        done: oneshot::Sender<()>,
    ) -> ClientStats {
        let mut state = self.fresh_attempt();
        loop {
            state = match state {
                State::Connecting {
                    endpoint,
                    redirects,
                } => self.attempt(endpoint, redirects).await,
                State::Disconnected { endpoint } => {
                    if self.discard_for(&mut queue).await {
                        State::Connecting {
                            endpoint,
                            redirects: 0,
                        }
                    } else {
                        debug!("Queue closed while disconnected, not reconnecting");
                        State::Draining(None)
                    }
                }
                State::Connected(mut session) => {
                    match self.send_all(&mut session, &mut queue).await {
                        Ok(()) => State::Draining(Some(session)),
                        Err(e) => {
                            session.close().await;
                            warn!(error = %e, "Collector session lost, reconnecting");
                            self.fresh_attempt()
                        }
                    }
                }
                State::Draining(session) => {
                    if let Some(mut session) = session {
                        session.close().await;
                    }
                    break;
                }
            };
        }

        info!(
            sent = self.stats.sent,
            discarded = self.stats.discarded,
            "Forwarding client stopped"
        );
        let _ = done.send(());
        self.stats
    }

    fn fresh_attempt(&self) -> State<C::Session> {
        State::Connecting {
            endpoint: self.endpoint.clone(),
            redirects: 0,
        }
    }

    async fn attempt(&mut self, endpoint: String, redirects: usize) -> State<C::Session> {
        match self.connector.connect(&endpoint).await {
            Ok(session) => {
                self.stats.connects += 1;
                info!(endpoint = %endpoint, "Connected");
                State::Connected(session)
            }
            Err(ForwardError::Redirect { status, location }) => {
                match resolve_location(&endpoint, &location) {
                    Ok(target) if redirects < MAX_IMMEDIATE_REDIRECTS => {
                        info!(status, target = %target, "Following collector redirect");
                        State::Connecting {
                            endpoint: target,
                            redirects: redirects + 1,
                        }
                    }
                    Ok(target) => {
                        warn!(
                            status,
                            target = %target,
                            "Collector redirected again, retrying later"
                        );
                        State::Disconnected { endpoint: target }
                    }
                    Err(e) => {
                        warn!(error = %e, "Could not follow collector redirect");
                        State::Disconnected { endpoint }
                    }
                }
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Could not connect to collector");
                State::Disconnected { endpoint }
            }
        }
    }

    /// Encode and send records until the queue closes or a send fails.
    async fn send_all(
        &mut self,
        session: &mut C::Session,
        queue: &mut mpsc::Receiver<CapturedLine>,
    ) -> Result<(), ForwardError> {
        while let Some(line) = queue.recv().await {
            session.send(encode_line(&line)).await?;
            self.stats.sent += 1;
        }
        Ok(())
    }

    /// Discard queued records for one reconnect delay.
    ///
    /// Returns `false` if the queue closed during the wait.
    async fn discard_for(&mut self, queue: &mut mpsc::Receiver<CapturedLine>) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => return true,
                line = queue.recv() => match line {
                    Some(_) => self.stats.discarded += 1,
                    None => return false,
                },
            }
        }
    }
}

/// Resolve a `Location` header (absolute or relative) against `endpoint`.
fn resolve_location(endpoint: &str, location: &str) -> Result<String, ForwardError> {
    let invalid = |reason: String| ForwardError::InvalidLocation {
        location: location.to_string(),
        reason,
    };
    let base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}
