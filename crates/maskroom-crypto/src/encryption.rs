//! Message encryption using AES-256-GCM.
//!
//! All functions are pure - random bytes must be provided by the caller.
//! This enables deterministic testing and keeps I/O out of the primitives.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{derivation::RoomKey, error::CryptoError};

/// AES-GCM nonce size (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt a plaintext under the room key.
///
/// Returns the ciphertext with the 16-byte authentication tag appended.
///
/// # Security
///
/// - The caller MUST supply a fresh random nonce per call; reusing a nonce
///   under the same key breaks confidentiality
/// - Authenticated encryption prevents tampering
pub fn seal(key: &RoomKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(nonce), plaintext) else {
        unreachable!("AES-GCM encryption cannot fail with valid inputs");
    };

    ciphertext
}

/// Decrypt a ciphertext under the room key.
///
/// Returns the plaintext.
///
/// # Errors
///
/// - `DecryptionFailed`: wrong key (peer used a different secret) or a
///   corrupted/forged ciphertext
pub fn open(
    key: &RoomKey,
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}
