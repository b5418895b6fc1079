//! In-memory router inventory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{RouterCredential, RouterId};

use crate::ports::outbound::{InventoryError, RouterInventory};

/// Process-local inventory; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    routers: RwLock<BTreeMap<RouterId, RouterCredential>>,
}

impl MemoryInventory {
    /// Empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventory seeded with `routers`.
    pub fn with_routers(routers: impl IntoIterator<Item = (RouterId, RouterCredential)>) -> Self {
        Self {
            routers: RwLock::new(routers.into_iter().collect()),
        }
    }
}

#[async_trait]
impl RouterInventory for MemoryInventory {
    async fn get(&self, id: &RouterId) -> Result<Option<RouterCredential>, InventoryError> {
        Ok(self.routers.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<(RouterId, RouterCredential)>, InventoryError> {
        Ok(self
            .routers
            .read()
            .iter()
            .map(|(id, cred)| (id.clone(), cred.clone()))
            .collect())
    }

    async fn upsert(
        &self,
        id: RouterId,
        credential: RouterCredential,
    ) -> Result<(), InventoryError> {
        self.routers.write().insert(id, credential);
        Ok(())
    }

    async fn delete(&self, id: &RouterId) -> Result<bool, InventoryError> {
        Ok(self.routers.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud() {
        let inventory = MemoryInventory::new();
        let id = RouterId::new("office").unwrap();

        assert!(inventory.get(&id).await.unwrap().is_none());
        inventory
            .upsert(id.clone(), RouterCredential::new("10.0.0.1", "admin", "pw"))
            .await
            .unwrap();
        assert_eq!(inventory.get(&id).await.unwrap().unwrap().host, "10.0.0.1");

        inventory
            .upsert(id.clone(), RouterCredential::new("10.0.0.2", "admin", "pw"))
            .await
            .unwrap();
        assert_eq!(inventory.list().await.unwrap().len(), 1);

        assert!(inventory.delete(&id).await.unwrap());
        assert!(!inventory.delete(&id).await.unwrap());
    }
}
