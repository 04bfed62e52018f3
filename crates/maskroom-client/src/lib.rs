//! Maskroom client
//!
//! Tokio driver for a live room session. Protocol logic stays in the Sans-IO
//! [`maskroom_core::RoomSession`]; this crate supplies the I/O around it:
//!
//! - [`transport`]: WebSocket connection to the relay at
//!   `<ws-scheme>://host/ws/<roomId>`
//! - [`connect_session`] / [`SessionHandle`]: one task per session owning the
//!   transport, the command channel, and the 1-second sweep ticker in a
//!   single `select!` loop; the ticker dies with the task, so teardown never
//!   leaves timers acting on a destroyed store
//! - [`ClientConfig`]: backend URL from the environment, default TTL
//!
//! The [`SessionHandle`] is the presentation-facing surface: it accepts user
//! intents (send, dust, secret and TTL changes) and publishes a
//! [`SessionSnapshot`] of connection status and the live message list
//! through a watch channel.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod driver;
pub mod transport;

use maskroom_core::Environment;
use maskroom_proto::RoomId;

pub use config::{BACKEND_URL_ENV, ClientConfig, DEFAULT_BACKEND_URL, DEFAULT_TTL_SECONDS};
pub use driver::{SessionClosed, SessionHandle, SessionSnapshot, connect_session};
pub use transport::TransportError;

/// Generate a fresh 8-hex-char room identifier from local entropy.
pub fn generate_room_id<E: Environment>(env: &E) -> RoomId {
    let mut entropy = [0u8; 4];
    env.random_bytes(&mut entropy);
    RoomId::from_entropy(entropy)
}
