//! WebSocket transport for the client.
//!
//! Thin wrapper around `tokio-tungstenite` providing type-isolated
//! reader/writer halves; protocol logic stays in the Sans-IO session. A
//! single [`connect`] handles URL derivation, the handshake, and the connect
//! timeout, and returns halves ready for use in `tokio::select!` loops.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use maskroom_proto::RoomId;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Bound on the `Connecting` state so a dead backend cannot hang a session
/// forever.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Concrete WebSocket stream type.
type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend URL has an unusable scheme or shape.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    /// TCP connect or WebSocket handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handshake did not complete within [`CONNECT_TIMEOUT`].
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// Frame could not be sent or received.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Received WebSocket message.
#[derive(Debug)]
pub enum WsMessage {
    /// UTF-8 text frame (the only kind the protocol uses).
    Text(String),
    /// Binary frame; ignored, the wire contract is text.
    Binary(Vec<u8>),
    /// Ping frame with payload.
    Ping(Vec<u8>),
    /// Pong frame with payload.
    Pong(Vec<u8>),
    /// Close frame.
    Close,
}

/// Write half of a relay connection.
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send a UTF-8 text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Text(text.to_string().into()))
            .await
            .map_err(|e| TransportError::Stream(e.to_string()))
    }

    /// Send a pong frame in response to a ping.
    pub async fn send_pong(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Pong(payload.into()))
            .await
            .map_err(|e| TransportError::Stream(e.to_string()))
    }

    /// Flush pending writes and close the connection.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.close().await.map_err(|e| TransportError::Stream(e.to_string()))
    }
}

/// Read half of a relay connection.
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Receive the next message, returning `None` when the stream ends.
    ///
    /// Raw `Frame` variants are skipped internally.
    pub async fn recv(&mut self) -> Option<Result<WsMessage, TransportError>> {
        loop {
            return match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => Some(Ok(WsMessage::Text(text.to_string()))),
                Ok(tungstenite::Message::Binary(data)) => {
                    Some(Ok(WsMessage::Binary(data.to_vec())))
                },
                Ok(tungstenite::Message::Ping(data)) => Some(Ok(WsMessage::Ping(data.to_vec()))),
                Ok(tungstenite::Message::Pong(data)) => Some(Ok(WsMessage::Pong(data.to_vec()))),
                Ok(tungstenite::Message::Close(_)) => Some(Ok(WsMessage::Close)),
                Ok(tungstenite::Message::Frame(_)) => continue,
                Err(e) => Some(Err(TransportError::Stream(e.to_string()))),
            };
        }
    }
}

/// Connect to the relay endpoint for a room.
///
/// Derives the WebSocket URL from the configured base, performs the
/// handshake under [`CONNECT_TIMEOUT`], and returns split (writer, reader)
/// halves.
pub async fn connect(
    base_url: &str,
    room_id: &RoomId,
) -> Result<(WsWriter, WsReader), TransportError> {
    let url = ws_url(base_url, room_id)?;

    let handshake = tokio_tungstenite::connect_async(url.as_str());
    let (ws_stream, _response) = tokio::time::timeout(CONNECT_TIMEOUT, handshake)
        .await
        .map_err(|_| TransportError::Timeout(CONNECT_TIMEOUT))?
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}

/// Derive the relay endpoint URL for a room.
///
/// Rewrites http(s) to ws(s), so the secure variant follows the base URL's
/// scheme, and appends the `/ws/<roomId>` path.
pub fn ws_url(base_url: &str, room_id: &RoomId) -> Result<String, TransportError> {
    let base = http_to_ws_scheme(base_url);
    if !(base.starts_with("ws://") || base.starts_with("wss://")) {
        return Err(TransportError::InvalidUrl(base_url.to_string()));
    }

    let trimmed = base.trim_end_matches('/');
    Ok(format!("{trimmed}/ws/{room_id}"))
}

/// Convert an HTTP(S) URL to WS(S) scheme.
///
/// Passes `ws://` and `wss://` through unchanged.
fn http_to_ws_scheme(url: &str) -> String {
    if url.starts_with("wss://") || url.starts_with("ws://") {
        url.to_string()
    } else {
        url.replacen("https://", "wss://", 1).replacen("http://", "ws://", 1)
    }
}
