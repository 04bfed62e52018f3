//! Maskroom Cryptographic Primitives
//!
//! Cryptographic building blocks for maskroom. Pure functions with
//! deterministic outputs. Callers provide random bytes for deterministic
//! testing.
//!
//! # Key Lifecycle
//!
//! Every room session derives one symmetric key from the human-chosen shared
//! secret. The derivation is deterministic, so any party holding the same
//! secret arrives at the same key without anything crossing the wire.
//!
//! ```text
//! Shared Secret (out of band)
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA256 → Room Key (256 bits, memoized per secret)
//!        │
//!        ▼
//! AES-256-GCM → Ciphertext (fresh 12-byte nonce per message)
//! ```
//!
//! # Security
//!
//! Confidentiality and authenticity:
//! - AES-256-GCM AEAD provides tamper-proof encryption
//! - A fresh random nonce per encryption call; nonce reuse under one key
//!   breaks confidentiality, so nonces are never derived from message state
//! - Failed authentication tag -> reject message
//!
//! Key hygiene:
//! - Room keys are zeroized on drop and redacted from `Debug` output
//! - The shared secret itself never reaches this crate's outputs
//!
//! Deliberate limitations (this is a demo protocol, not Signal):
//! - No forward secrecy and no ratcheting; one key per secret value
//! - A fixed application-wide salt, so equal secrets derive equal keys
//!   across rooms
//! - No sender authentication beyond holding the shared secret

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod derivation;
mod encryption;
mod error;

pub use derivation::{KEY_SIZE, RoomKey, derive_room_key};
pub use encryption::{NONCE_SIZE, TAG_SIZE, open, seal};
pub use error::CryptoError;
