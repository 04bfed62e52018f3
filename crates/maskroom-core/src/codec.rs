//! Message codec: plaintext payloads to wire envelopes and back.
//!
//! Message content enters an [`Envelope`] only as ciphertext, so the relay
//! never has anything to read. Decryption failures are a typed result
//! consumed by the session's receive path: a peer holding a different secret
//! produces them constantly, and they are dropped there, not propagated.

use maskroom_crypto::{CryptoError, NONCE_SIZE, RoomKey, open, seal};
use maskroom_proto::{Envelope, Payload};
use thiserror::Error;

/// Reasons an envelope failed to decode into a payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Envelope is not a cipher envelope (e.g. a misrouted control signal).
    #[error("envelope carries no ciphertext")]
    NotCipher,

    /// Nonce field has the wrong length.
    #[error("envelope nonce has length {len}, expected {NONCE_SIZE}")]
    BadNonce {
        /// Length of the received nonce field.
        len: usize,
    },

    /// Authentication failed: wrong key, or corrupted/forged ciphertext.
    #[error(transparent)]
    Decrypt(#[from] CryptoError),

    /// Decrypted bytes are not a valid payload structure.
    #[error("decrypted payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Seal a plaintext payload into a cipher envelope.
///
/// The nonce must be fresh random bytes, one per call; the caller provides
/// it so the operation stays a pure function of (key, payload, randomness).
/// `ttl` and `ts` are mirrored in clear on the envelope for the relay.
pub fn encrypt(key: &RoomKey, payload: &Payload, nonce: [u8; NONCE_SIZE]) -> Envelope {
    let Ok(plaintext) = serde_json::to_vec(payload) else {
        unreachable!("payload serialization cannot fail");
    };

    Envelope::Cipher {
        iv: nonce.to_vec(),
        ciphertext: seal(key, &nonce, &plaintext),
        ttl: payload.ttl,
        ts: payload.ts,
    }
}

/// Open a cipher envelope back into a plaintext payload.
///
/// # Errors
///
/// Every variant of [`CodecError`] is an expected, non-fatal condition on
/// this channel; the receive path drops the envelope and moves on.
pub fn decrypt(key: &RoomKey, envelope: &Envelope) -> Result<Payload, CodecError> {
    let Envelope::Cipher { iv, ciphertext, .. } = envelope else {
        return Err(CodecError::NotCipher);
    };

    let nonce: [u8; NONCE_SIZE] =
        iv.as_slice().try_into().map_err(|_| CodecError::BadNonce { len: iv.len() })?;

    let plaintext = open(key, &nonce, ciphertext)?;
    Ok(serde_json::from_slice(&plaintext)?)
}
