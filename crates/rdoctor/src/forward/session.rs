//! Collector transport: the connect/send seam and its WebSocket implementation.

use std::future::Future;
use std::sync::Once;

use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::http::header::LOCATION;
use tokio_tungstenite::tungstenite::http::{HeaderMap, StatusCode};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::error::ForwardError;

/// Opens sessions to the collector.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    /// Open one session to `url`. A redirect is reported as
    /// [`ForwardError::Redirect`] so the caller decides whether to follow it.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Session, ForwardError>> + Send;
}

/// One live, outbound-only session.
pub trait Session: Send + 'static {
    /// Transmit one text message.
    fn send(&mut self, payload: String) -> impl Future<Output = Result<(), ForwardError>> + Send;

    /// Close the session; errors are not reported.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

static CRYPTO_PROVIDER: Once = Once::new();

/// WebSocket connector for `ws://` and `wss://` collectors.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    _private: (),
}

impl WebSocketConnector {
    pub fn new() -> Self {
        // wss:// needs a process-wide rustls provider.
        CRYPTO_PROVIDER.call_once(|| {
            let _ = rustls::crypto::ring::default_provider().install_default();
        });
        Self { _private: () }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for WebSocketConnector {
    type Session = WebSocketSession;

    async fn connect(&self, url: &str) -> Result<WebSocketSession, ForwardError> {
        match connect_async(url).await {
            Ok((stream, response)) => {
                debug!(status = %response.status(), "WebSocket handshake complete");
                Ok(WebSocketSession { stream })
            }
            Err(WsError::Http(response)) => {
                Err(classify_http_failure(response.status(), response.headers()))
            }
            Err(e) => Err(ForwardError::Connect(e.to_string())),
        }
    }
}

/// Turn a non-101 handshake response into a redirect or a plain failure.
fn classify_http_failure(status: StatusCode, headers: &HeaderMap) -> ForwardError {
    if !status.is_redirection() {
        return ForwardError::Handshake {
            status: status.as_u16(),
        };
    }
    match headers.get(LOCATION).and_then(|value| value.to_str().ok()) {
        Some(location) => ForwardError::Redirect {
            status: status.as_u16(),
            location: location.to_string(),
        },
        None => ForwardError::MissingLocation {
            status: status.as_u16(),
        },
    }
}

/// A connected WebSocket; incoming messages are never read.
pub struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Session for WebSocketSession {
    async fn send(&mut self, payload: String) -> Result<(), ForwardError> {
        self.stream
            .send(Message::text(payload))
            .await
            .map_err(|e| ForwardError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::http::HeaderValue;

    #[test]
    fn redirect_with_location_is_reported() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("wss://elsewhere.test/x"));
        match classify_http_failure(StatusCode::FOUND, &headers) {
            ForwardError::Redirect { status, location } => {
                assert_eq!(status, 302);
                assert_eq!(location, "wss://elsewhere.test/x");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn redirect_without_location_is_a_failure() {
        let err = classify_http_failure(StatusCode::MOVED_PERMANENTLY, &HeaderMap::new());
        assert!(matches!(err, ForwardError::MissingLocation { status: 301 }));
    }

    #[test]
    fn other_statuses_are_handshake_failures() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/ignored"));
        let err = classify_http_failure(StatusCode::UNAUTHORIZED, &headers);
        assert!(matches!(err, ForwardError::Handshake { status: 401 }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = WebSocketConnector::new();
        let result = connector.connect(&format!("ws://{addr}/")).await;
        assert!(matches!(result, Err(ForwardError::Connect(_))));
    }
}
