//! Per-room membership registry and fan-out.
//!
//! Pure bookkeeping, no I/O: connection tasks register an outbound channel
//! per member and feed inbound frames to [`RelayState::broadcast`]. Frames
//! are forwarded verbatim; the relay never looks inside them.
//!
//! Delivery is best-effort: a member whose outbound queue is full has its
//! frame dropped rather than stalling the room.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::mpsc;

/// Outbound queue depth per member.
const MEMBER_BUFFER: usize = 64;

/// Rooms keyed by id, members keyed by their outbound channel.
type RoomMap = HashMap<String, HashMap<u64, mpsc::Sender<String>>>;

/// Handle identifying one member within one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberId(u64);

/// Room membership registry.
///
/// The mutex guards only in-memory maps and is never held across an await;
/// actual sends happen on the collected channel handles after the lock is
/// released.
#[derive(Debug, Default)]
pub struct RelayState {
    rooms: Mutex<RoomMap>,
    next_member_id: AtomicU64,
}

impl RelayState {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member in a room, creating the room if needed.
    ///
    /// Returns the member's id and the receiving end of its outbound queue.
    pub fn join(&self, room_id: &str) -> (MemberId, mpsc::Receiver<String>) {
        let member_id = self.next_member_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(MEMBER_BUFFER);

        let mut rooms = self.lock_rooms();
        let room = rooms.entry(room_id.to_string()).or_default();
        room.insert(member_id, tx);

        tracing::debug!(room = room_id, member = member_id, members = room.len(), "member joined");

        (MemberId(member_id), rx)
    }

    /// Remove a member, dropping the room once it is empty.
    pub fn leave(&self, room_id: &str, member: MemberId) {
        let mut rooms = self.lock_rooms();
        if let Some(room) = rooms.get_mut(room_id) {
            room.remove(&member.0);
            if room.is_empty() {
                rooms.remove(room_id);
                tracing::debug!(room = room_id, "room destroyed");
            }
        }
    }

    /// Relay a frame to every member of the room except the sender.
    ///
    /// Returns the number of members the frame was queued for.
    pub fn broadcast(&self, room_id: &str, sender: MemberId, frame: &str) -> usize {
        let recipients: Vec<mpsc::Sender<String>> = {
            let rooms = self.lock_rooms();
            let Some(room) = rooms.get(room_id) else {
                return 0;
            };
            room.iter().filter(|(id, _)| **id != sender.0).map(|(_, tx)| tx.clone()).collect()
        };

        let mut delivered = 0;
        for tx in recipients {
            match tx.try_send(frame.to_string()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(room = room_id, error = %err, "dropping frame for slow member");
                },
            }
        }
        delivered
    }

    /// Number of rooms with at least one member.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    /// Number of members currently in a room.
    #[must_use]
    pub fn member_count(&self, room_id: &str) -> usize {
        self.lock_rooms().get(room_id).map_or(0, HashMap::len)
    }

    fn lock_rooms(&self) -> std::sync::MutexGuard<'_, RoomMap> {
        match self.rooms.lock() {
            Ok(guard) => guard,
            // A poisoned lock means a panic while holding it; the maps are
            // still structurally sound, so keep relaying.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
