//! Session driver: one task per live room session.
//!
//! Owns the core [`RoomSession`], the transport halves, the command channel,
//! and the sweep ticker in a single `select!` loop, executing the actions
//! the state machine returns. The presentation layer talks to the task
//! through [`SessionHandle`] and observes it through [`SessionSnapshot`].

use maskroom_core::{
    ConnectionState, DisplayedMessage, Environment, RoomSession, SessionAction, SessionEvent,
};
use maskroom_proto::RoomId;
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};

use crate::{
    config::ClientConfig,
    transport::{self, TransportError, WsMessage, WsReader, WsWriter},
};

/// Sweep cadence; 1-second resolution keeps "time remaining" displays honest.
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Command channel depth. User intents are small and infrequent.
const COMMAND_BUFFER: usize = 32;

/// The session task has stopped and can no longer accept commands.
#[derive(Debug, Error)]
#[error("session task has stopped")]
pub struct SessionClosed;

/// Point-in-time view of a session, published after every processed event.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Connection status for the UI affordance.
    pub status: ConnectionState,
    /// Room this session is bound to.
    pub room_id: RoomId,
    /// Current shared secret (local only, never transmitted).
    pub secret: String,
    /// Session default TTL in seconds.
    pub default_ttl_seconds: u64,
    /// Visible messages, oldest first.
    pub messages: Vec<DisplayedMessage>,
}

/// User intents forwarded to the session task.
enum Command {
    Send { text: String, ttl_override: Option<u64> },
    Dust,
    ChangeSecret(String),
    SetDefaultTtl(u64),
    Close,
}

/// Handle to a running session task.
///
/// Dropping the handle (or calling [`SessionHandle::close`]) ends the task,
/// which tears down the transport and the sweep ticker with it.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send a message with the session's default TTL.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.command(Command::Send { text: text.into(), ttl_override: None }).await
    }

    /// Send a message with a per-message TTL.
    pub async fn send_with_ttl(
        &self,
        text: impl Into<String>,
        ttl_seconds: u64,
    ) -> Result<(), SessionClosed> {
        self.command(Command::Send { text: text.into(), ttl_override: Some(ttl_seconds) }).await
    }

    /// Wipe the room for every member.
    pub async fn dust(&self) -> Result<(), SessionClosed> {
        self.command(Command::Dust).await
    }

    /// Change the shared secret. Future messages use the new key; displayed
    /// history is untouched.
    pub async fn change_secret(&self, secret: impl Into<String>) -> Result<(), SessionClosed> {
        self.command(Command::ChangeSecret(secret.into())).await
    }

    /// Change the session default TTL (clamped to the protocol minimum).
    pub async fn set_default_ttl(&self, ttl_seconds: u64) -> Result<(), SessionClosed> {
        self.command(Command::SetDefaultTtl(ttl_seconds)).await
    }

    /// Disconnect and end the session task.
    pub async fn close(self) {
        let _ = self.commands.send(Command::Close).await;
    }

    /// Current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    async fn command(&self, command: Command) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }
}

/// Connect to a room and spawn its session task.
///
/// Resolves once the transport handshake completes (or fails); the returned
/// handle's first snapshot is already `Connected`.
pub async fn connect_session<E: Environment>(
    env: E,
    config: &ClientConfig,
    room_id: RoomId,
    secret: String,
) -> Result<SessionHandle, TransportError> {
    let mut session =
        RoomSession::new(env, room_id.clone(), secret, config.default_ttl_seconds);
    session.handle(SessionEvent::Open);

    let (writer, reader) = transport::connect(&config.backend_url, &room_id).await?;
    session.handle(SessionEvent::TransportOpened);

    tracing::debug!(room = %room_id, "session connected");

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(snapshot_of(&session));

    tokio::spawn(run(session, writer, Some(reader), command_rx, snapshot_tx));

    Ok(SessionHandle { commands: command_tx, snapshot: snapshot_rx })
}

/// Session task main loop.
async fn run<E: Environment>(
    mut session: RoomSession<E>,
    mut writer: WsWriter,
    mut reader: Option<WsReader>,
    mut commands: mpsc::Receiver<Command>,
    snapshot: watch::Sender<SessionSnapshot>,
) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                execute(&mut session, SessionEvent::Tick, &mut writer).await;
            },
            message = recv_or_pending(&mut reader) => match message {
                Some(Ok(WsMessage::Text(frame))) => {
                    execute(&mut session, SessionEvent::FrameReceived(frame), &mut writer).await;
                },
                Some(Ok(WsMessage::Ping(payload))) => {
                    if let Err(err) = writer.send_pong(payload).await {
                        tracing::trace!(error = %err, "pong failed");
                    }
                },
                Some(Ok(WsMessage::Pong(_) | WsMessage::Binary(_))) => {
                    // The wire contract is text frames only.
                },
                Some(Ok(WsMessage::Close)) | Some(Err(_)) | None => {
                    reader = None;
                    execute(&mut session, SessionEvent::TransportClosed, &mut writer).await;
                },
            },
            command = commands.recv() => match command {
                Some(Command::Send { text, ttl_override }) => {
                    execute(&mut session, SessionEvent::Send { text, ttl_override }, &mut writer)
                        .await;
                },
                Some(Command::Dust) => {
                    execute(&mut session, SessionEvent::Dust, &mut writer).await;
                },
                Some(Command::ChangeSecret(secret)) => {
                    execute(&mut session, SessionEvent::SecretChanged(secret), &mut writer).await;
                },
                Some(Command::SetDefaultTtl(ttl_seconds)) => {
                    execute(&mut session, SessionEvent::DefaultTtlChanged(ttl_seconds), &mut writer)
                        .await;
                },
                Some(Command::Close) | None => {
                    execute(&mut session, SessionEvent::Close, &mut writer).await;
                    let _ = snapshot.send(snapshot_of(&session));
                    break;
                },
            },
        }

        publish(&snapshot, &session);
    }
}

/// Run one event through the state machine and perform its actions.
async fn execute<E: Environment>(
    session: &mut RoomSession<E>,
    event: SessionEvent,
    writer: &mut WsWriter,
) {
    for action in session.handle(event) {
        match action {
            SessionAction::Transmit(frame) => {
                if let Err(err) = writer.send_text(&frame).await {
                    // The reader side will observe the close and move the
                    // session to Disconnected; sends are best-effort.
                    tracing::debug!(error = %err, "transmit failed");
                }
            },
            SessionAction::Disconnect => {
                if let Err(err) = writer.close().await {
                    tracing::trace!(error = %err, "transport close failed");
                }
            },
            SessionAction::Connect { room_id } => {
                // The transport is established before the task starts.
                tracing::warn!(room = %room_id, "unexpected connect action mid-session");
            },
        }
    }
}

/// Receive from the reader, or park forever once the transport is gone so
/// the other select arms keep the session responsive.
async fn recv_or_pending(
    reader: &mut Option<WsReader>,
) -> Option<Result<WsMessage, TransportError>> {
    match reader {
        Some(reader) => reader.recv().await,
        None => std::future::pending().await,
    }
}

fn publish<E: Environment>(snapshot: &watch::Sender<SessionSnapshot>, session: &RoomSession<E>) {
    snapshot.send_if_modified(|current| {
        let next = snapshot_of(session);
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

fn snapshot_of<E: Environment>(session: &RoomSession<E>) -> SessionSnapshot {
    SessionSnapshot {
        status: session.state(),
        room_id: session.room_id().clone(),
        secret: session.secret().to_string(),
        default_ttl_seconds: session.default_ttl_seconds(),
        messages: session.messages().to_vec(),
    }
}
