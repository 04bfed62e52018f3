//! Envelope and payload types.
//!
//! An [`Envelope`] is the transport-visible wrapper around either an
//! encrypted message or a control signal. A [`Payload`] is the plaintext
//! structure that gets JSON-serialized and sealed into a cipher envelope;
//! it never appears on the wire unencrypted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from frame encoding/decoding.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame is not valid JSON, or is JSON without a recognizable shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Plaintext message structure.
///
/// Serialized to JSON and sealed before transmission. The `ts` and `ttl`
/// fields are duplicated in clear on the cipher envelope so the relay and
/// receivers can reason about expiry without the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Message text.
    pub text: String,
    /// Send time, milliseconds since the Unix epoch.
    pub ts: u64,
    /// Time-to-live in seconds after which the message is destroyed.
    pub ttl: u64,
}

/// Transport-visible message wrapper.
///
/// Exactly two meaningful variants cross the wire. Anything else decodes to
/// [`Envelope::Unknown`], which receivers drop without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// An encrypted message blob.
    Cipher {
        /// 12-byte AES-GCM nonce, serialized as a JSON number array.
        iv: Vec<u8>,
        /// Ciphertext including the 16-byte authentication tag.
        ciphertext: Vec<u8>,
        /// Time-to-live in seconds (readable by the relay).
        ttl: u64,
        /// Send time in Unix milliseconds (readable by the relay).
        ts: u64,
    },

    /// Room-wide wipe signal. Unencrypted, honored from any sender.
    Dust,

    /// Any `type` value this build does not understand.
    #[serde(other)]
    Unknown,
}

impl Envelope {
    /// Encode to a single JSON text frame.
    pub fn to_frame(&self) -> String {
        let Ok(frame) = serde_json::to_string(self) else {
            unreachable!("envelope serialization cannot fail");
        };
        frame
    }

    /// Decode a JSON text frame.
    ///
    /// Frames with an unrecognized `type` decode successfully to
    /// [`Envelope::Unknown`]. Frames that are not JSON objects with a `type`
    /// field are errors; the session layer drops both silently.
    pub fn from_frame(frame: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cipher_envelope_wire_shape() {
        let envelope = Envelope::Cipher {
            iv: vec![1; 12],
            ciphertext: vec![0xAA, 0xBB],
            ttl: 60,
            ts: 1_700_000_000_000,
        };

        let value: serde_json::Value = serde_json::from_str(&envelope.to_frame()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "cipher",
                "iv": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
                "ciphertext": [170, 187],
                "ttl": 60,
                "ts": 1_700_000_000_000_u64,
            })
        );
    }

    #[test]
    fn dust_envelope_wire_shape() {
        assert_eq!(Envelope::Dust.to_frame(), r#"{"type":"dust"}"#);
    }

    #[test]
    fn frame_roundtrip() {
        let envelope = Envelope::Cipher {
            iv: (0..12).collect(),
            ciphertext: vec![9, 8, 7],
            ttl: 5,
            ts: 42,
        };

        let decoded = Envelope::from_frame(&envelope.to_frame()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let decoded = Envelope::from_frame(r#"{"type":"presence","who":"bob"}"#).unwrap();
        assert_eq!(decoded, Envelope::Unknown);
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(Envelope::from_frame(r#"{"iv":[1],"ciphertext":[2]}"#).is_err());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Envelope::from_frame("not json at all").is_err());
        assert!(Envelope::from_frame("").is_err());
    }

    #[test]
    fn payload_wire_shape() {
        let payload = Payload { text: "hello".to_string(), ts: 1000, ttl: 60 };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"text": "hello", "ts": 1000, "ttl": 60}));
    }
}
