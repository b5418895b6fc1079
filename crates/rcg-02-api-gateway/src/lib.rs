//! # RCG-02 API Gateway
//!
//! Everything between a dashboard request and a router: rate limiting,
//! the encrypted session cookie, the validation gate and a scoped router
//! connection per request.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      API GATEWAY (rcg-02)                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  request                                                         │
//! │     │                                                            │
//! │     ▼                                                            │
//! │  RateLimitLayer (auth · sensitive · api · readonly)              │
//! │     │   fixed window per tier:client, lazy background sweep      │
//! │     ▼                                                            │
//! │  SessionStore (cookie ⇄ AES-GCM token ⇄ RouterCredential)        │
//! │     │   tampered == absent                                       │
//! │     ▼                                                            │
//! │  Validation gate (schema per mutating command)                   │
//! │     │   no I/O for invalid input                                 │
//! │     ▼                                                            │
//! │  RouterGateway::with_router                                      │
//! │     │   connect → serial writes → disconnect on every path       │
//! └─────┼────────────────────────────────────────────────────────────┘
//!       ▼
//!   rcg-01-router-protocol ──TCP 8728──▶ RouterOS
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use rcg_02_api_gateway::{GatewayConfig, GatewayService};
//!
//! let service = GatewayService::new(config).await?;
//! service.serve(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod gateway;
pub mod middleware;
pub mod ports;
pub mod routes;
pub mod service;
pub mod session;
pub mod validation;
pub mod vouchers;

pub use adapters::{FileInventory, MemoryInventory};
pub use domain::config::{
    ConfigError, Environment, GatewayConfig, RateLimitConfig, SessionConfig, TierPolicy,
};
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use gateway::RouterGateway;
pub use middleware::rate_limit::{RateLimitDecision, RateLimitLayer, RateLimiter, Tier};
pub use ports::outbound::{
    InventoryError, ManualTimeSource, RouterInventory, SystemTimeSource, TimeSource,
};
pub use service::{build_router, AppState, GatewayService};
pub use session::{RouterSession, SessionData, SessionStore};
pub use validation::{validate, Schema, ValidationError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
