//! WebSocket transport for a single streaming exchange.
//!
//! A [`SessionConnection`] owns the transport for exactly one exchange:
//! connect, send the conversation once, yield inbound fragments, and close.
//! There is no reconnection; an unreachable endpoint or a mid-stream failure
//! is reported upward and the exchange ends.

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CONNECTION_CLOSES, CONNECTION_OPEN_ERRORS, CONNECTION_OPENS, STREAM_ERRORS, STREAM_FRAGMENTS,
    STREAM_SENTINELS,
};
use crate::types::{ConversationPayload, MessageLog, SessionHandle};

/// Reserved text frame acknowledging stream initialization. It signals only
/// that the remote side has accepted the session and never becomes content.
pub const INIT_SENTINEL: &str = "|INIT|";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of a [`SessionConnection`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection attempted yet.
    Idle,
    /// Connection attempt in progress.
    Connecting,
    /// Connected; the conversation has not been sent.
    Open,
    /// Conversation sent; inbound fragments may arrive.
    Streaming,
    /// Close requested.
    Closing,
    /// Connection finished cleanly.
    Closed,
    /// Connection ended with a transport failure.
    Errored,
}

impl ConnectionState {
    /// Human-readable state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Idle",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::Streaming => "Streaming",
            ConnectionState::Closing => "Closing",
            ConnectionState::Closed => "Closed",
            ConnectionState::Errored => "Errored",
        }
    }

    /// Returns true if no further events can be produced from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }
}

/// One inbound unit of transport activity, consumed by the controller.
///
/// Exactly one of `Closed`/`Errored` is yielded per connection; never both.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A content fragment for the in-progress assistant turn.
    Fragment(String),
    /// The transport finished cleanly.
    Closed,
    /// The transport failed mid-stream.
    Errored(Error),
}

/// Owns the transport connection for one exchange.
#[derive(Debug)]
pub struct SessionConnection {
    state: ConnectionState,
    stream: Option<WsStream>,
}

impl SessionConnection {
    /// Connects to the streaming endpoint for `handle`.
    ///
    /// The failure mode is reported, not retried.
    pub async fn open(endpoint: &Url, handle: &SessionHandle) -> Result<Self> {
        let url = stream_url(endpoint, handle)?;
        let mut conn = Self {
            state: ConnectionState::Connecting,
            stream: None,
        };
        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                CONNECTION_OPENS.click();
                conn.stream = Some(stream);
                conn.state = ConnectionState::Open;
                Ok(conn)
            }
            Err(err) => {
                CONNECTION_OPEN_ERRORS.click();
                conn.state = ConnectionState::Errored;
                Err(Error::connection(
                    format!("failed to reach {url}: {err}"),
                    Some(Box::new(err)),
                ))
            }
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Transmits the entire conversation-so-far as a single framed message.
    ///
    /// Valid only in the `Open` state; calling it anywhere else is a
    /// programming error.
    pub async fn send_conversation(&mut self, log: &MessageLog) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(Error::invalid_state(
                "send_conversation requires an open connection",
                self.state.as_str(),
            ));
        }
        let payload = serde_json::to_string(&ConversationPayload::from_log(log))?;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::invalid_state("connection has no stream", "Open"))?;
        use futures::SinkExt;
        match stream.send(WsMessage::Text(payload)).await {
            Ok(()) => {
                self.state = ConnectionState::Streaming;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Errored;
                Err(Error::transport(
                    format!("failed to send conversation: {err}"),
                    Some(Box::new(err)),
                ))
            }
        }
    }

    /// Yields the next transport event.
    ///
    /// Sentinel frames are recognized and discarded here; ping, pong, and
    /// binary frames are not content. After a terminal event this keeps
    /// returning `Closed`.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        if self.state.is_terminal() {
            return ConnectionEvent::Closed;
        }
        let Some(stream) = self.stream.as_mut() else {
            self.state = ConnectionState::Closed;
            return ConnectionEvent::Closed;
        };
        loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    if text == INIT_SENTINEL {
                        STREAM_SENTINELS.click();
                        continue;
                    }
                    STREAM_FRAGMENTS.click();
                    return ConnectionEvent::Fragment(text);
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    self.state = ConnectionState::Closed;
                    return ConnectionEvent::Closed;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    self.state = ConnectionState::Errored;
                    return ConnectionEvent::Errored(Error::transport(
                        format!("stream failed: {err}"),
                        Some(Box::new(err)),
                    ));
                }
            }
        }
    }

    /// Requests a clean shutdown; idempotent.
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = ConnectionState::Closing;
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.close(None).await;
        }
        CONNECTION_CLOSES.click();
        self.state = ConnectionState::Closed;
    }

    #[cfg(test)]
    pub(crate) fn detached(state: ConnectionState) -> Self {
        Self {
            state,
            stream: None,
        }
    }
}

/// Derives the streaming URL from an HTTP(S) endpoint and a session handle.
///
/// `http` becomes `ws` and `https` becomes `wss`; `ws`/`wss` pass through.
/// The handle is embedded in the connection target as the final path segment.
pub(crate) fn stream_url(endpoint: &Url, handle: &SessionHandle) -> Result<Url> {
    let mut url = endpoint.clone();
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::validation(
                format!("unsupported endpoint scheme: {other}"),
                Some("endpoint".to_string()),
            ));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::url(format!("cannot use scheme {scheme}"), None))?;
    url.path_segments_mut()
        .map_err(|_| Error::url("endpoint cannot be a base URL", None))?
        .pop_if_empty()
        .extend(["chat-with-user", handle.as_str()]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SessionHandle {
        SessionHandle::new("66a1f00d")
    }

    #[test]
    fn stream_url_maps_http_to_ws() {
        let endpoint = Url::parse("http://localhost:8000").unwrap();
        let url = stream_url(&endpoint, &handle()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/chat-with-user/66a1f00d");
    }

    #[test]
    fn stream_url_maps_https_to_wss() {
        let endpoint = Url::parse("https://chat.example.com/api/").unwrap();
        let url = stream_url(&endpoint, &handle()).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://chat.example.com/api/chat-with-user/66a1f00d"
        );
    }

    #[test]
    fn stream_url_rejects_other_schemes() {
        let endpoint = Url::parse("ftp://example.com").unwrap();
        let err = stream_url(&endpoint, &handle()).unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn send_outside_open_is_invalid_state() {
        let mut conn = SessionConnection::detached(ConnectionState::Closed);
        let err = conn
            .send_conversation(&MessageLog::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut conn = SessionConnection::detached(ConnectionState::Streaming);
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn next_event_after_terminal_reports_closed() {
        let mut conn = SessionConnection::detached(ConnectionState::Errored);
        assert!(matches!(conn.next_event().await, ConnectionEvent::Closed));
    }

    #[tokio::test]
    async fn open_against_unreachable_endpoint_fails() {
        // Port 1 is essentially never listening.
        let endpoint = Url::parse("http://127.0.0.1:1").unwrap();
        let err = SessionConnection::open(&endpoint, &handle())
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn sentinel_frames_never_become_fragments() {
        use futures::SinkExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Consume the conversation frame, then stream the reply.
            let _ = ws.next().await;
            ws.send(WsMessage::Text(INIT_SENTINEL.to_string()))
                .await
                .unwrap();
            ws.send(WsMessage::Text("Hel".to_string())).await.unwrap();
            ws.send(WsMessage::Text("lo".to_string())).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let endpoint = Url::parse(&format!("http://{addr}")).unwrap();
        let mut conn = SessionConnection::open(&endpoint, &handle()).await.unwrap();
        let mut log = MessageLog::new();
        log.push_user("hi");
        conn.send_conversation(&log).await.unwrap();

        // The sentinel is swallowed inside next_event; the first observable
        // event is the first content fragment.
        assert!(matches!(conn.next_event().await, ConnectionEvent::Fragment(t) if t == "Hel"));
        assert!(matches!(conn.next_event().await, ConnectionEvent::Fragment(t) if t == "lo"));
        assert!(matches!(conn.next_event().await, ConnectionEvent::Closed));
        server.await.unwrap();
    }
}
