//! JSON file router inventory.
//!
//! The whole map is held in memory and the file is rewritten on every
//! mutation: written to a sibling temp file, then renamed over the target.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{RouterCredential, RouterId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::ports::outbound::{InventoryError, RouterInventory};

type RouterMap = BTreeMap<RouterId, RouterCredential>;

/// Inventory persisted as one JSON object keyed by router id.
#[derive(Debug)]
pub struct FileInventory {
    path: PathBuf,
    routers: RwLock<RouterMap>,
    /// Serializes persist calls so renames land in mutation order.
    write_lock: Mutex<()>,
}

impl FileInventory {
    /// Open `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InventoryError> {
        let path = path.into();
        let routers = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => RouterMap::new(),
            Ok(bytes) => {
                let routers: RouterMap = serde_json::from_slice(&bytes)
                    .map_err(|e| InventoryError::Corrupt(e.to_string()))?;
                for (id, credential) in &routers {
                    credential
                        .check()
                        .map_err(|e| InventoryError::Corrupt(format!("{id}: {e}")))?;
                }
                routers
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RouterMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), routers = routers.len(), "router inventory loaded");
        Ok(Self {
            path,
            routers: RwLock::new(routers),
            write_lock: Mutex::new(()),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy, persist it, then publish it.
    ///
    /// A failed write leaves the in-memory map untouched.
    async fn mutate<T>(&self, change: impl FnOnce(&mut RouterMap) -> T) -> Result<T, InventoryError> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.routers.read().clone();
        let result = change(&mut next);
        self.persist(&next).await?;
        *self.routers.write() = next;
        Ok(result)
    }

    async fn persist(&self, routers: &RouterMap) -> Result<(), InventoryError> {
        let json = serde_json::to_vec_pretty(routers)
            .map_err(|e| InventoryError::Corrupt(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), routers = routers.len(), "router inventory written");
        Ok(())
    }
}

#[async_trait]
impl RouterInventory for FileInventory {
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
        self.mutate(|routers| {
            routers.insert(id, credential);
        })
        .await
    }

    async fn delete(&self, id: &RouterId) -> Result<bool, InventoryError> {
        self.mutate(|routers| routers.remove(id).is_some()).await
    }
}
