//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag did not verify
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Token is not base64 or shorter than the fixed header
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Operator secret is empty
    #[error("Encryption secret must not be empty")]
    EmptySecret,
}
