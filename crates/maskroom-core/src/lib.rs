//! Maskroom protocol core
//!
//! Sans-IO state for an ephemeral, end-to-end-encrypted room session. The
//! session is a pure state machine: it consumes [`SessionEvent`] inputs and
//! produces [`SessionAction`] instructions for a driver to execute, so the
//! same code runs under a real transport and in deterministic tests.
//!
//! # Components
//!
//! - [`RoomSession`]: event/action state machine orchestrating one room
//! - [`EphemeralStore`]: the ordered, self-destructing message list
//! - [`codec`]: seals plaintext payloads into wire envelopes and back
//! - [`Environment`]: clock and entropy abstraction ([`SystemEnv`] for
//!   production, [`SimEnv`] for virtual time in tests)
//!
//! # Data flow
//!
//! ```text
//! secret ──▶ derive (memoized) ──▶ RoomKey
//!                                    │
//! user text ──▶ codec::encrypt ──────┴──▶ Envelope ──▶ Transmit action
//! inbound frame ──▶ codec::decrypt ──▶ EphemeralStore ──▶ presentation
//! ```
//!
//! Undecryptable or malformed inbound frames are dropped silently: a peer
//! holding a different secret is an expected condition on this channel, not
//! an error worth surfacing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
mod env;
mod session;
mod store;

pub use codec::CodecError;
pub use env::{Environment, SimEnv, SystemEnv};
pub use session::{
    ConnectionState, MIN_DEFAULT_TTL_SECONDS, RoomSession, SessionAction, SessionEvent,
};
pub use store::{Direction, DisplayedMessage, EphemeralStore};
