//! # Shared Types Crate
//!
//! Router identity and credential records used across the gateway crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `RouterCredential` is defined once and
//!   consumed read-only by the protocol gateway for one request or session.
//! - **No Secret Leakage**: `Debug` output never contains the router secret.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
