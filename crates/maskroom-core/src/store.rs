//! Ephemeral message store.
//!
//! Holds the decrypted messages currently visible in a room session, each
//! tagged with an expiry instant. Entries are insertion-ordered
//! (chronological as sent/received, never re-sorted by expiry) and exist
//! only in memory; expiry, dust, or process exit are the three ways out.

/// Direction of a message relative to the local session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from a peer.
    Inbound,
    /// Sent by this session, echoed locally without a network round-trip.
    Outbound,
}

/// A decrypted message visible in the local session.
///
/// Owned exclusively by the local [`EphemeralStore`]; never shared across
/// sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedMessage {
    /// Locally unique identifier, for presentation-layer list keying.
    pub id: u64,
    /// Message text.
    pub text: String,
    /// Send time from the payload, Unix milliseconds.
    pub sent_at_ms: u64,
    /// Time-to-live in seconds.
    pub ttl_seconds: u64,
    /// Local expiry instant: arrival time plus TTL.
    pub expires_at_ms: u64,
    /// Whether this session sent or received the message.
    pub direction: Direction,
}

/// Insertion-ordered list of visible messages with TTL-based expiry.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    entries: Vec<DisplayedMessage>,
    next_id: u64,
}

impl EphemeralStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning a fresh id and its expiry instant.
    ///
    /// Expiry counts from `now_ms` (local arrival/send time), not from the
    /// sender's `sent_at_ms` timestamp.
    ///
    /// Returns the assigned id.
    pub fn append(
        &mut self,
        text: String,
        sent_at_ms: u64,
        ttl_seconds: u64,
        direction: Direction,
        now_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push(DisplayedMessage {
            id,
            text,
            sent_at_ms,
            ttl_seconds,
            expires_at_ms: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
            direction,
        });

        id
    }

    /// Remove every entry whose expiry has passed.
    ///
    /// After a sweep, `expires_at_ms > now_ms` holds for all remaining
    /// entries. Returns the number of entries destroyed.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.expires_at_ms > now_ms);
        before - self.entries.len()
    }

    /// Remove all entries unconditionally (the dust path).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Currently visible messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[DisplayedMessage] {
        &self.entries
    }

    /// Number of visible messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
