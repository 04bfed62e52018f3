//! Maskroom wire model
//!
//! Types for everything that crosses the relay: the [`Envelope`] wrapping
//! either an encrypted message or a control signal, and the inner [`Payload`]
//! that exists only in plaintext form on the two ends of the channel.
//!
//! # Wire format
//!
//! The transport carries UTF-8 JSON text frames, one object per frame, tagged
//! by a `type` field:
//!
//! ```text
//! {"type":"cipher","iv":[..12 bytes..],"ciphertext":[..],"ttl":60,"ts":1700000000000}
//! {"type":"dust"}
//! ```
//!
//! The relay may inspect `type`, `ttl`, and `ts` for routing and diagnostics.
//! It never sees plaintext: message content only enters an envelope as
//! AEAD ciphertext, and unknown `type` values decode to an ignorable variant
//! so the protocol can grow without breaking old peers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod room;

pub use envelope::{Envelope, Payload, WireError};
pub use room::RoomId;
