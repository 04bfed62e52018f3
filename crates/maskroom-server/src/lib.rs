//! Maskroom relay server
//!
//! A blind relay: accepts WebSocket connections at `/ws/<roomId>`,
//! multiplexes members per room, and forwards text frames verbatim to every
//! other member of the same room. It holds no keys, parses no envelope
//! contents, and persists nothing; a room exists exactly as long as it has
//! members.
//!
//! Protocol obligations on this side are deliberately thin:
//! - one UTF-8 JSON object per text frame, relayed opaquely
//! - binary frames ignored (the wire contract is text)
//! - fan-out excludes the original sender (clients echo locally)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod relay;
mod server;

pub use relay::RelayState;
pub use server::RelayServer;
