//! Router protocol errors.
//!
//! Connect failures keep their distinguishing cause here so it can be logged;
//! callers at the HTTP boundary collapse them into one generic failure.

use std::time::Duration;

use thiserror::Error;

/// Result alias for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors raised by the router protocol client.
#[derive(Debug, Error)]
pub enum RouterError {
    /// `write` called without a live connection.
    #[error("not connected")]
    NotConnected,

    /// `connect` called on a handle that is already connected.
    #[error("already connected")]
    AlreadyConnected,

    /// TCP connect plus login did not finish in time.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// TCP connect failed.
    #[error("connection failed: {0}")]
    ConnectRefused(String),

    /// Router rejected the login.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// Transport error after connecting.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes on the wire did not form a valid sentence.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Command path rejected before any I/O.
    #[error("invalid command path: {0}")]
    InvalidPath(String),

    /// Router answered `!trap`.
    #[error("router trap: {message}")]
    Trap {
        /// RouterOS trap category, when sent.
        category: Option<u8>,
        /// Router's own message.
        message: String,
    },

    /// Router answered `!fatal` and closed the session.
    #[error("router closed the session: {0}")]
    Fatal(String),

    /// Operation is not offered by the resource kind.
    #[error("{operation} is not supported on {resource}")]
    Unsupported {
        /// Operation name.
        operation: &'static str,
        /// Resource path.
        resource: &'static str,
    },

    /// Reply lacked data the operation needs.
    #[error("router reply missing {0}")]
    MissingData(&'static str),
}

/// Coarse classification of a `!trap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    /// Unknown command path or menu.
    NoSuchCommand,
    /// Login lacks the policy for this command.
    PermissionDenied,
    /// Anything else (bad argument, duplicate entry, ...).
    Other,
}

impl RouterError {
    /// True for every failure that happens while establishing a session.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            RouterError::ConnectTimeout(_)
                | RouterError::ConnectRefused(_)
                | RouterError::AuthRejected(_)
        )
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RouterError::ConnectTimeout(_) => "timeout",
            RouterError::ConnectRefused(_) => "refused",
            RouterError::AuthRejected(_) => "auth_rejected",
            RouterError::Trap { .. } => "trap",
            RouterError::Fatal(_) => "fatal",
            RouterError::NotConnected => "not_connected",
            _ => "error",
        }
    }

    /// Classify a trap; `None` for non-trap errors.
    pub fn trap_kind(&self) -> Option<TrapKind> {
        let RouterError::Trap { category, message } = self else {
            return None;
        };
        let lower = message.to_ascii_lowercase();
        if lower.contains("no such command")
            || (lower.contains("no such item") && *category == Some(0))
        {
            Some(TrapKind::NoSuchCommand)
        } else if lower.contains("not enough permissions") || lower.contains("permission denied") {
            Some(TrapKind::PermissionDenied)
        } else {
            Some(TrapKind::Other)
        }
    }

    /// Whether the transport is unusable after this error.
    pub(crate) fn poisons_connection(&self) -> bool {
        matches!(
            self,
            RouterError::Io(_) | RouterError::Protocol(_) | RouterError::Fatal(_)
        )
    }
}
