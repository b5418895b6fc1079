//! # Validation Gate
//!
//! Structural and bounds checks on inbound command parameters. A request
//! that fails its schema is answered with every violated field at once and
//! never reaches the router.

pub mod schema;
pub mod schemas;

pub use schema::{validate, FieldKind, FieldRule, Schema, ValidationError};
