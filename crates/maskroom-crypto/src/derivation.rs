//! Room key derivation using PBKDF2-HMAC-SHA256.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

/// Application-wide salt for room key derivation.
///
/// A compile-time constant: two sessions must derive identical keys from
/// identical secrets with nothing exchanged over the network.
const ROOM_KEY_SALT: &[u8] = b"gpm-demo";

/// PBKDF2 iteration count.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Size of a room key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Symmetric room key derived from the shared secret.
///
/// Zeroized on drop. The raw bytes are exposed for the codec; they must
/// never be logged or serialized.
#[derive(Clone)]
pub struct RoomKey([u8; KEY_SIZE]);

impl RoomKey {
    /// Raw key material.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Implement Drop to zeroize key material
impl Drop for RoomKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomKey(..)")
    }
}

/// Derive the room key from a shared secret.
///
/// Deterministic: the same secret always yields a bit-identical key within
/// one build.
///
/// The empty string is accepted and yields a valid but trivially guessable
/// key; the session layer refuses to send until the secret is non-empty.
pub fn derive_room_key(secret: &str) -> RoomKey {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), ROOM_KEY_SALT, PBKDF2_ITERATIONS, &mut key);
    RoomKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let key1 = derive_room_key("pineapple");
        let key2 = derive_room_key("pineapple");

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "same secret must produce same key");
    }

    #[test]
    fn different_secrets_produce_different_keys() {
        let key_a = derive_room_key("pineapple");
        let key_b = derive_room_key("different");

        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
    }

    #[test]
    fn near_miss_secrets_produce_different_keys() {
        let key_a = derive_room_key("pineapple");
        let key_b = derive_room_key("pineapple ");

        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
    }

    #[test]
    fn empty_secret_is_accepted() {
        // Documented limitation: weak but valid.
        let key = derive_room_key("");
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = derive_room_key("topsecret");
        let rendered = format!("{key:?}");

        assert_eq!(rendered, "RoomKey(..)");
    }
}
