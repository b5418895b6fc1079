//! Gateway configuration and error taxonomy.

pub mod config;
pub mod error;
