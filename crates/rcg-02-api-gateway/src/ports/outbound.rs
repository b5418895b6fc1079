//! Outbound ports for the API Gateway.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use shared_types::{RouterCredential, RouterId};
use thiserror::Error;

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Unix time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // clock before the epoch: report 0 rather than panic
            .unwrap_or(0)
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource(AtomicU64);

impl ManualTimeSource {
    /// Clock reading `start_millis`.
    pub fn new(start_millis: u64) -> Self {
        Self(AtomicU64::new(start_millis))
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Router inventory failures.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Backing store I/O failed.
    #[error("inventory i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data did not parse.
    #[error("inventory data is corrupt: {0}")]
    Corrupt(String),
}

/// Key-value store of manageable routers.
///
/// The gateway only reads credentials through this port; where they live
/// (file, database) is the adapter's business.
#[async_trait]
pub trait RouterInventory: Send + Sync {
    /// Credential for `id`, if known.
    async fn get(&self, id: &RouterId) -> Result<Option<RouterCredential>, InventoryError>;

    /// All routers, ordered by id.
    async fn list(&self) -> Result<Vec<(RouterId, RouterCredential)>, InventoryError>;

    /// Insert or replace.
    async fn upsert(&self, id: RouterId, credential: RouterCredential)
        -> Result<(), InventoryError>;

    /// Remove; returns whether the id existed.
    async fn delete(&self, id: &RouterId) -> Result<bool, InventoryError>;
}
