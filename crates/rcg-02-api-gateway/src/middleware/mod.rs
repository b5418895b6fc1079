//! Middleware stack for the API Gateway.
//!
//! Layer order: Request → Trace → RateLimit (per route tier) → Handler

pub mod client_ip;
pub mod rate_limit;

pub use client_ip::{client_identifier, UNKNOWN_CLIENT};
pub use rate_limit::{RateLimitDecision, RateLimitLayer, RateLimiter, Tier};
