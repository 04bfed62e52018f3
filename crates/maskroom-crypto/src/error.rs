//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from the cryptographic primitives.
///
/// Carries no detail: a decryption failure means "wrong key or tampered
/// ciphertext" and the caller drops the message without telling the two
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Authentication tag did not verify.
    #[error("decryption failed: authentication tag mismatch")]
    DecryptionFailed,
}
