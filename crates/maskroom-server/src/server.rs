//! Accept loop and per-connection bridging.
//!
//! Each connection is one spawned task: it resolves the room from the
//! handshake path, registers with the [`RelayState`], and then bridges
//! frames between the socket and the room's fan-out until either side goes
//! away.

use std::{io, net::SocketAddr, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{
    Message,
    handshake::server::{ErrorResponse, Request, Response},
    http::StatusCode,
};

use crate::relay::RelayState;

/// Listening relay server.
pub struct RelayServer {
    listener: TcpListener,
    state: Arc<RelayState>,
}

impl RelayServer {
    /// Bind the relay to an address.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state: Arc::new(RelayState::new()) })
    }

    /// Address the relay is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process ends.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let state = Arc::clone(&self.state);
            tokio::spawn(serve_connection(state, stream, peer));
        }
    }
}

/// Extract the room id from a request path of the form `/ws/<roomId>`.
fn room_from_path(path: &str) -> Option<&str> {
    let room = path.strip_prefix("/ws/")?;
    if room.is_empty() { None } else { Some(room) }
}

/// Drive one member's connection for its lifetime.
async fn serve_connection(state: Arc<RelayState>, stream: TcpStream, peer: SocketAddr) {
    let mut room_id: Option<String> = None;

    let callback = |request: &Request, response: Response| match room_from_path(
        request.uri().path(),
    ) {
        Some(room) => {
            room_id = Some(room.to_string());
            Ok(response)
        },
        None => {
            let mut rejection = ErrorResponse::new(Some("expected path /ws/<roomId>".to_string()));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        },
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws_stream) => ws_stream,
        Err(err) => {
            tracing::debug!(%peer, error = %err, "handshake rejected");
            return;
        },
    };
    let Some(room_id) = room_id else {
        tracing::debug!(%peer, "handshake accepted without a room path");
        return;
    };

    let (member, mut outbound) = state.join(&room_id);
    let (mut sink, mut source) = ws_stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = sink.send(Message::Text(frame.into())).await {
                        tracing::debug!(%peer, error = %err, "send failed");
                        break;
                    }
                },
                None => break,
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(frame))) => {
                    // Opaque relay: forward verbatim, never inspect.
                    state.broadcast(&room_id, member, frame.as_ref());
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(err) = sink.send(Message::Pong(payload)).await {
                        tracing::trace!(%peer, error = %err, "pong failed");
                        break;
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Binary and pong frames: not part of the contract.
                },
                Some(Err(err)) => {
                    tracing::debug!(%peer, error = %err, "receive failed");
                    break;
                },
            },
        }
    }

    state.leave(&room_id, member);
    tracing::debug!(%peer, room = %room_id, "member disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_path_parsing() {
        assert_eq!(room_from_path("/ws/ab12cd34"), Some("ab12cd34"));
        assert_eq!(room_from_path("/ws/"), None);
        assert_eq!(room_from_path("/ws"), None);
        assert_eq!(room_from_path("/"), None);
        assert_eq!(room_from_path("/other/ab12cd34"), None);
    }
}
