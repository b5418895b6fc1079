//! # RCG-01 Router Protocol
//!
//! Client for the RouterOS API: the binary sentence protocol every dashboard
//! page ultimately goes through to reach a router.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ROUTER PROTOCOL (rcg-01)                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  resources/   list · add · update · remove · enable · disable│
//! │       │              (typed params per resource kind)        │
//! │       ▼                                                      │
//! │  domain/      Command ── Word ── CommandParams ── Reply      │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  connection   Disconnected → Connecting → Connected          │
//! │       │       (login, tagged request/reply, /quit)           │
//! │       ▼                                                      │
//! │  wire         length-prefixed words, zero-length terminator  │
//! └───────┼──────────────────────────────────────────────────────┘
//!         ▼
//!    TCP 8728 (RouterOS API service)
//! ```
//!
//! ## Lifecycle
//!
//! A [`RouterConnection`] is owned by exactly one request. It is opened,
//! used for a serial batch of writes and closed again; there is no pooling.
//! Dropping a connection closes the socket, so release happens on every
//! exit path even when [`RouterConnection::disconnect`] is never reached.
//!
//! ## Usage
//!
//! ```ignore
//! use rcg_01_router_protocol::RouterConnection;
//!
//! let mut conn = RouterConnection::open(&credential, Duration::from_secs(10)).await?;
//! let users = conn.hotspot_users().list(Vec::new()).await?;
//! conn.disconnect().await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod connection;
pub mod domain;
pub mod error;
pub mod resources;
pub mod wire;

/// Scripted RouterOS server for tests.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use connection::{ConnectionState, RouterConnection};
pub use domain::command::Command;
pub use domain::params::{
    assignment_words, CommandParams, DhcpLeaseParams, HotspotProfileParams, HotspotUserParams,
    IpBindingParams, NoParams, ParamValue, PppProfileParams, PppSecretParams,
};
pub use domain::reply::{Record, Reply, ReplyKind, Sentence};
pub use domain::word::Word;
pub use error::{RouterError, RouterResult, TrapKind};
pub use resources::{Resource, ResourceAction, ResourceKind, SystemApi};

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
