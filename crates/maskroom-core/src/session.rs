//! Room session state machine.
//!
//! Orchestrates one room: the derived key (memoized per secret), the
//! transport lifecycle, and the send/receive/dust operations the
//! presentation layer invokes. Uses the action pattern: `handle` consumes an
//! event and returns actions for the driver to execute, keeping the state
//! machine pure (no I/O) and testable without a network.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  Open   ┌────────────┐  TransportOpened  ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────────────>│ Connected │
//! └──────────────┘         └────────────┘                   └───────────┘
//!        ▲                       │                                │
//!        │                       │ TransportClosed                │ Close /
//!        │                       ▼                                │ TransportClosed
//!        └────────────────────────────────────────────────────────┘
//! ```
//!
//! Send is valid only in `Connected` with a non-empty secret; anything else
//! is a silent no-op, matching the lossy, best-effort character of the
//! channel. The message store survives disconnection: entries die by their
//! own TTL or by dust, never by a dropped link.

use maskroom_crypto::{NONCE_SIZE, RoomKey, derive_room_key};
use maskroom_proto::{Envelope, Payload, RoomId};

use crate::{
    codec,
    env::Environment,
    store::{Direction, DisplayedMessage, EphemeralStore},
};

/// Lower bound for the session's default TTL, in seconds.
pub const MIN_DEFAULT_TTL_SECONDS: u64 = 5;

/// Connection state exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the relay.
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected and relaying.
    Connected,
}

/// Events the driver feeds into the session.
///
/// The driver is responsible for:
/// - Forwarding application intents (send, dust, secret changes)
/// - Delivering raw inbound text frames from the transport
/// - Driving time forward via periodic ticks
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Application wants to connect to the room.
    Open,

    /// Transport reports the connection is established.
    TransportOpened,

    /// Transport reports the connection failed or closed.
    TransportClosed,

    /// Application changed the shared secret.
    ///
    /// Invalidates the memoized key; messages already displayed keep the
    /// plaintext decrypted under the old key; history is never re-keyed.
    SecretChanged(String),

    /// Application changed the default TTL (clamped to at least
    /// [`MIN_DEFAULT_TTL_SECONDS`]).
    DefaultTtlChanged(u64),

    /// Application wants to send a message.
    Send {
        /// Message text.
        text: String,
        /// Per-message TTL override; `None` uses the session default.
        ttl_override: Option<u64>,
    },

    /// Raw text frame received from the transport.
    FrameReceived(String),

    /// Application wants to wipe the room for everyone.
    Dust,

    /// Periodic tick; sweeps expired messages.
    Tick,

    /// Application wants to disconnect.
    Close,
}

/// Actions the session produces for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Establish a transport connection bound to this room.
    Connect {
        /// Room to connect to.
        room_id: RoomId,
    },

    /// Transmit one JSON text frame to the room.
    Transmit(String),

    /// Tear down the transport connection.
    Disconnect,
}

/// Memoized key derivation result, keyed by the secret it came from.
struct CachedKey {
    secret: String,
    key: RoomKey,
}

/// State machine for one room session.
///
/// Owns exactly one room id, one mutable secret, the derived key cache, and
/// the local message store.
pub struct RoomSession<E: Environment> {
    env: E,
    state: ConnectionState,
    room_id: RoomId,
    secret: String,
    key_cache: Option<CachedKey>,
    default_ttl_seconds: u64,
    store: EphemeralStore,
}

impl<E: Environment> RoomSession<E> {
    /// Create a session for a room with an initial secret and default TTL.
    pub fn new(env: E, room_id: RoomId, secret: String, default_ttl_seconds: u64) -> Self {
        Self {
            env,
            state: ConnectionState::Disconnected,
            room_id,
            secret,
            key_cache: None,
            default_ttl_seconds: default_ttl_seconds.max(MIN_DEFAULT_TTL_SECONDS),
            store: EphemeralStore::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The room this session is bound to.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Current shared secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Session default TTL in seconds.
    #[must_use]
    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Currently visible messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[DisplayedMessage] {
        self.store.messages()
    }

    /// Process an event and return actions for the driver.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Open => self.open(),
            SessionEvent::TransportOpened => {
                self.state = ConnectionState::Connected;
                Vec::new()
            },
            SessionEvent::TransportClosed => {
                self.state = ConnectionState::Disconnected;
                Vec::new()
            },
            SessionEvent::SecretChanged(secret) => {
                // Lazily recomputed on next use; the cache staleness check
                // compares against this value.
                self.secret = secret;
                Vec::new()
            },
            SessionEvent::DefaultTtlChanged(ttl_seconds) => {
                self.default_ttl_seconds = ttl_seconds.max(MIN_DEFAULT_TTL_SECONDS);
                Vec::new()
            },
            SessionEvent::Send { text, ttl_override } => self.send(text, ttl_override),
            SessionEvent::FrameReceived(raw) => {
                self.receive(&raw);
                Vec::new()
            },
            SessionEvent::Dust => self.dust(),
            SessionEvent::Tick => {
                let removed = self.store.sweep(self.env.now_ms());
                if removed > 0 {
                    tracing::trace!(removed, "swept expired messages");
                }
                Vec::new()
            },
            SessionEvent::Close => self.close(),
        }
    }

    fn open(&mut self) -> Vec<SessionAction> {
        if self.state != ConnectionState::Disconnected {
            tracing::trace!(state = ?self.state, "open ignored: already connecting or connected");
            return Vec::new();
        }

        self.state = ConnectionState::Connecting;
        vec![SessionAction::Connect { room_id: self.room_id.clone() }]
    }

    fn send(&mut self, text: String, ttl_override: Option<u64>) -> Vec<SessionAction> {
        if self.state != ConnectionState::Connected {
            tracing::trace!("send ignored: not connected");
            return Vec::new();
        }
        let Some(key) = self.room_key() else {
            tracing::trace!("send ignored: no usable secret");
            return Vec::new();
        };

        let now_ms = self.env.now_ms();
        let ttl = ttl_override.unwrap_or(self.default_ttl_seconds);
        let payload = Payload { text, ts: now_ms, ttl };

        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce);

        let frame = codec::encrypt(&key, &payload, nonce).to_frame();

        // Echo locally from the plaintext we already hold.
        self.store.append(payload.text, payload.ts, payload.ttl, Direction::Outbound, now_ms);

        vec![SessionAction::Transmit(frame)]
    }

    fn receive(&mut self, raw: &str) {
        let envelope = match Envelope::from_frame(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::trace!(error = %err, "dropping malformed frame");
                return;
            },
        };

        match envelope {
            Envelope::Cipher { .. } => {
                let Some(key) = self.room_key() else {
                    tracing::trace!("dropping cipher frame: no usable secret");
                    return;
                };
                match codec::decrypt(&key, &envelope) {
                    Ok(payload) => {
                        let now_ms = self.env.now_ms();
                        self.store.append(
                            payload.text,
                            payload.ts,
                            payload.ttl,
                            Direction::Inbound,
                            now_ms,
                        );
                    },
                    Err(err) => {
                        // Expected whenever a peer uses a different secret.
                        tracing::trace!(error = %err, "dropping undecryptable frame");
                    },
                }
            },
            Envelope::Dust => {
                // Control signal, honored from any sender.
                self.store.clear();
            },
            Envelope::Unknown => {
                tracing::trace!("ignoring frame with unknown type");
            },
        }
    }

    fn dust(&mut self) -> Vec<SessionAction> {
        // Optimistic local wipe, independent of transport delivery.
        self.store.clear();

        if self.state == ConnectionState::Connected {
            vec![SessionAction::Transmit(Envelope::Dust.to_frame())]
        } else {
            Vec::new()
        }
    }

    fn close(&mut self) -> Vec<SessionAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        self.state = ConnectionState::Disconnected;
        // The store outlives the connection: only TTL or dust remove entries.
        vec![SessionAction::Disconnect]
    }

    /// The room key for the current secret, deriving and memoizing on first
    /// use and whenever the secret has changed since the last derivation.
    ///
    /// `None` while the secret is empty.
    fn room_key(&mut self) -> Option<RoomKey> {
        if self.secret.is_empty() {
            return None;
        }

        let stale = self.key_cache.as_ref().is_none_or(|cached| cached.secret != self.secret);
        if stale {
            self.key_cache = Some(CachedKey {
                secret: self.secret.clone(),
                key: derive_room_key(&self.secret),
            });
        }

        self.key_cache.as_ref().map(|cached| cached.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::env::SimEnv;

    use super::*;

    fn connected_session(env: &SimEnv, secret: &str) -> RoomSession<SimEnv> {
        let mut session =
            RoomSession::new(env.clone(), RoomId::new("ab12cd34"), secret.to_string(), 60);
        session.handle(SessionEvent::Open);
        session.handle(SessionEvent::TransportOpened);
        session
    }

    fn transmitted_frame(actions: &[SessionAction]) -> &str {
        match actions {
            [SessionAction::Transmit(frame)] => frame,
            other => panic!("expected a single Transmit action, got {other:?}"),
        }
    }

    #[test]
    fn open_connects_once() {
        let env = SimEnv::new();
        let mut session =
            RoomSession::new(env, RoomId::new("ab12cd34"), "pineapple".to_string(), 60);

        let actions = session.handle(SessionEvent::Open);
        assert_eq!(actions, vec![SessionAction::Connect { room_id: RoomId::new("ab12cd34") }]);
        assert_eq!(session.state(), ConnectionState::Connecting);

        // A second open while connecting is ignored.
        assert!(session.handle(SessionEvent::Open).is_empty());
    }

    #[test]
    fn transport_events_drive_connection_state() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");
        assert_eq!(session.state(), ConnectionState::Connected);

        session.handle(SessionEvent::TransportClosed);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_is_noop_when_disconnected() {
        let env = SimEnv::new();
        let mut session =
            RoomSession::new(env, RoomId::new("ab12cd34"), "pineapple".to_string(), 60);

        let actions =
            session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });

        assert!(actions.is_empty());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn send_is_noop_with_empty_secret() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "");

        let actions =
            session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });

        assert!(actions.is_empty());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn send_transmits_cipher_and_echoes_locally() {
        let env = SimEnv::new();
        env.set_now_ms(1_000);
        let mut session = connected_session(&env, "pineapple");

        let actions =
            session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });

        // Wire side: a cipher envelope that the same secret decrypts.
        let envelope = Envelope::from_frame(transmitted_frame(&actions)).unwrap();
        let key = derive_room_key("pineapple");
        let payload = codec::decrypt(&key, &envelope).unwrap();
        assert_eq!(payload, Payload { text: "hello".to_string(), ts: 1_000, ttl: 60 });

        // Local side: one outbound message, no round-trip.
        let [message] = session.messages() else {
            panic!("expected exactly one local message");
        };
        assert_eq!(message.text, "hello");
        assert_eq!(message.direction, Direction::Outbound);
        assert_eq!(message.expires_at_ms, 1_000 + 60_000);
    }

    #[test]
    fn send_plaintext_never_appears_on_the_wire() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");

        let actions = session.handle(SessionEvent::Send {
            text: "attack at dawn".to_string(),
            ttl_override: None,
        });

        assert!(!transmitted_frame(&actions).contains("attack at dawn"));
    }

    #[test]
    fn send_uses_fresh_nonce_per_message() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");

        let first = session
            .handle(SessionEvent::Send { text: "same".to_string(), ttl_override: None });
        let second = session
            .handle(SessionEvent::Send { text: "same".to_string(), ttl_override: None });

        let Envelope::Cipher { iv: iv1, .. } =
            Envelope::from_frame(transmitted_frame(&first)).unwrap()
        else {
            panic!("expected cipher envelope");
        };
        let Envelope::Cipher { iv: iv2, .. } =
            Envelope::from_frame(transmitted_frame(&second)).unwrap()
        else {
            panic!("expected cipher envelope");
        };

        assert_ne!(iv1, iv2);
    }

    #[test]
    fn ttl_override_takes_precedence() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");

        let actions = session
            .handle(SessionEvent::Send { text: "quick".to_string(), ttl_override: Some(5) });

        let Envelope::Cipher { ttl, .. } =
            Envelope::from_frame(transmitted_frame(&actions)).unwrap()
        else {
            panic!("expected cipher envelope");
        };
        assert_eq!(ttl, 5);
        assert_eq!(session.messages()[0].ttl_seconds, 5);
    }

    #[test]
    fn default_ttl_is_clamped_to_minimum() {
        let env = SimEnv::new();
        let mut session =
            RoomSession::new(env, RoomId::new("ab12cd34"), "pineapple".to_string(), 1);
        assert_eq!(session.default_ttl_seconds(), MIN_DEFAULT_TTL_SECONDS);

        session.handle(SessionEvent::DefaultTtlChanged(2));
        assert_eq!(session.default_ttl_seconds(), MIN_DEFAULT_TTL_SECONDS);

        session.handle(SessionEvent::DefaultTtlChanged(120));
        assert_eq!(session.default_ttl_seconds(), 120);
    }

    #[test]
    fn receive_appends_inbound_message() {
        let env = SimEnv::new();
        env.set_now_ms(2_000);
        let mut sender = connected_session(&env, "pineapple");
        let mut receiver = connected_session(&env, "pineapple");

        let actions =
            sender.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });
        receiver.handle(SessionEvent::FrameReceived(transmitted_frame(&actions).to_string()));

        let [message] = receiver.messages() else {
            panic!("expected exactly one inbound message");
        };
        assert_eq!(message.text, "hello");
        assert_eq!(message.direction, Direction::Inbound);
    }

    #[test]
    fn mismatched_secret_drops_silently() {
        let env = SimEnv::new();
        let mut sender = connected_session(&env, "pineapple");
        let mut eavesdropper = connected_session(&env, "different");

        let actions =
            sender.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });
        eavesdropper
            .handle(SessionEvent::FrameReceived(transmitted_frame(&actions).to_string()));

        assert!(eavesdropper.messages().is_empty());
    }

    #[test]
    fn malformed_and_unknown_frames_drop_silently() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");

        session.handle(SessionEvent::FrameReceived("not json".to_string()));
        session.handle(SessionEvent::FrameReceived("{\"no\":\"type\"}".to_string()));
        session.handle(SessionEvent::FrameReceived(
            "{\"type\":\"presence\",\"who\":\"bob\"}".to_string(),
        ));

        assert!(session.messages().is_empty());
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn dust_frame_clears_store_unconditionally() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");
        session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });
        assert_eq!(session.messages().len(), 1);

        session.handle(SessionEvent::FrameReceived("{\"type\":\"dust\"}".to_string()));

        assert!(session.messages().is_empty());
    }

    #[test]
    fn dust_request_clears_and_broadcasts() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");
        session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });

        let actions = session.handle(SessionEvent::Dust);

        assert_eq!(actions, vec![SessionAction::Transmit("{\"type\":\"dust\"}".to_string())]);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn dust_while_disconnected_still_clears_locally() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");
        session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });
        session.handle(SessionEvent::TransportClosed);

        let actions = session.handle(SessionEvent::Dust);

        assert!(actions.is_empty(), "nothing to transmit without a transport");
        assert!(session.messages().is_empty());
    }

    #[test]
    fn tick_sweeps_expired_messages() {
        let env = SimEnv::new();
        env.set_now_ms(0);
        let mut session = connected_session(&env, "pineapple");
        session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: Some(5) });

        env.set_now_ms(4_900);
        session.handle(SessionEvent::Tick);
        assert_eq!(session.messages().len(), 1, "still visible before expiry");

        env.set_now_ms(5_100);
        session.handle(SessionEvent::Tick);
        assert!(session.messages().is_empty(), "removed after expiry");
    }

    #[test]
    fn close_disconnects_but_keeps_messages() {
        let env = SimEnv::new();
        let mut session = connected_session(&env, "pineapple");
        session.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });

        let actions = session.handle(SessionEvent::Close);

        assert_eq!(actions, vec![SessionAction::Disconnect]);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.messages().len(), 1, "store survives disconnection");
    }

    #[test]
    fn secret_change_rekeys_future_messages_only() {
        let env = SimEnv::new();
        let mut sender = connected_session(&env, "pineapple");
        let mut old_peer = connected_session(&env, "pineapple");
        let mut new_peer = connected_session(&env, "newsecret");

        let before =
            sender.handle(SessionEvent::Send { text: "old".to_string(), ttl_override: None });
        sender.handle(SessionEvent::SecretChanged("newsecret".to_string()));
        let after =
            sender.handle(SessionEvent::Send { text: "new".to_string(), ttl_override: None });

        // The pre-change frame stays readable by the old secret only.
        old_peer.handle(SessionEvent::FrameReceived(transmitted_frame(&before).to_string()));
        old_peer.handle(SessionEvent::FrameReceived(transmitted_frame(&after).to_string()));
        assert_eq!(old_peer.messages().len(), 1);
        assert_eq!(old_peer.messages()[0].text, "old");

        // The post-change frame is readable by the new secret only.
        new_peer.handle(SessionEvent::FrameReceived(transmitted_frame(&before).to_string()));
        new_peer.handle(SessionEvent::FrameReceived(transmitted_frame(&after).to_string()));
        assert_eq!(new_peer.messages().len(), 1);
        assert_eq!(new_peer.messages()[0].text, "new");

        // Sender's own echo of the old message is untouched by the re-key.
        assert_eq!(sender.messages().len(), 2);
    }

    #[test]
    fn receive_with_empty_secret_drops_cipher_frames() {
        let env = SimEnv::new();
        let mut sender = connected_session(&env, "pineapple");
        let mut receiver = connected_session(&env, "");

        let actions =
            sender.handle(SessionEvent::Send { text: "hello".to_string(), ttl_override: None });
        receiver.handle(SessionEvent::FrameReceived(transmitted_frame(&actions).to_string()));

        assert!(receiver.messages().is_empty());
    }
}
