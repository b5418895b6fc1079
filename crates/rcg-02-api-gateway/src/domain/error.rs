//! Gateway error taxonomy.
//!
//! Every failure a handler can produce maps to one [`ApiError`] variant with
//! a fixed status code. End users only ever see the generic message; router
//! and crypto detail stays in the server log.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ports::outbound::InventoryError;
use crate::validation::ValidationError;

/// Error returned to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Input failed its schema; carries the joined field messages.
    #[error("{0}")]
    Validation(String),

    /// Rate limit tier exhausted for this client.
    #[error("too many requests, retry in {retry_after}s")]
    RateLimited {
        /// Seconds until the window resets
        retry_after: u64,
    },

    /// No session, or a session that failed to open.
    #[error("not authenticated")]
    Unauthenticated,

    /// Router unreachable, credentials rejected or connect timeout.
    #[error("unable to connect to router")]
    ConnectFailure,

    /// Router rejected a command.
    #[error("router command failed")]
    CommandFailure,

    /// Unknown router id or resource.
    #[error("{0} not found")]
    NotFound(String),

    /// Anything else; detail is logged, not returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::ConnectFailure => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CommandFailure | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Validation error from a plain message.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let ApiError::RateLimited { retry_after } = self {
            body["retryAfter"] = json!(retry_after);
        }

        let mut response = (self.status(), Json(body)).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        tracing::error!(error = %e, "router inventory failure");
        ApiError::Internal
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Session key could not be derived
    #[error("session key error: {0}")]
    Crypto(#[from] shared_crypto::CryptoError),

    /// Inventory could not be opened
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Metrics registry failure
    #[error("telemetry error: {0}")]
    Telemetry(#[from] rcg_telemetry::TelemetryError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
