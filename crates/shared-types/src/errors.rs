//! # Error Types
//!
//! Structural errors for router identity and credential records.

use thiserror::Error;

/// A credential or identifier failed a structural check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Router identifier is empty, too long or has illegal characters.
    #[error("invalid router id: {0}")]
    InvalidRouterId(String),

    /// Host is empty or too long.
    #[error("router host is missing or too long")]
    InvalidHost,

    /// Port 0 is never a valid API port.
    #[error("router port must be between 1 and 65535")]
    InvalidPort,

    /// Login principal is empty.
    #[error("router username is missing")]
    MissingUsername,
}
