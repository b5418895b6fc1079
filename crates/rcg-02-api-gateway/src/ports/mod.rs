//! Ports for the API Gateway.

pub mod outbound;
