//! Room identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque room identifier.
///
/// Names a transport multiplexing group. Rooms are ephemeral and ids are not
/// checked for collisions; two parties picking the same id simply share a
/// room, which is the product's join mechanism anyway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a user-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a fresh 8-hex-char identifier from caller-provided entropy.
    pub fn from_entropy(entropy: [u8; 4]) -> Self {
        use std::fmt::Write as _;

        let mut id = String::with_capacity(8);
        for byte in entropy {
            let Ok(()) = write!(id, "{byte:02x}") else {
                unreachable!("writing to a String cannot fail");
            };
        }
        Self(id)
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_entropy_is_8_lowercase_hex_chars() {
        let id = RoomId::from_entropy([0xAB, 0x12, 0xCD, 0x34]);
        assert_eq!(id.as_str(), "ab12cd34");
    }

    #[test]
    fn from_entropy_zero_padded() {
        let id = RoomId::from_entropy([0x00, 0x01, 0x0F, 0xF0]);
        assert_eq!(id.as_str(), "00010ff0");
    }

    #[test]
    fn user_supplied_ids_pass_through() {
        let id = RoomId::new("my weird room!");
        assert_eq!(id.to_string(), "my weird room!");
    }
}
