//! System and interface reads.

use crate::connection::RouterConnection;
use crate::domain::command::Command;
use crate::domain::reply::Record;
use crate::domain::word::Word;
use crate::error::{RouterError, RouterResult};
use crate::resources::ResourceKind;

/// Read-only system menus.
pub struct SystemApi<'c> {
    conn: &'c mut RouterConnection,
}

impl<'c> SystemApi<'c> {
    pub(crate) fn new(conn: &'c mut RouterConnection) -> Self {
        Self { conn }
    }

    async fn single(&mut self, path: &'static str) -> RouterResult<Record> {
        let mut records = self.conn.write(path, Vec::new()).await?;
        if records.is_empty() {
            return Err(RouterError::MissingData(path));
        }
        Ok(records.swap_remove(0))
    }

    /// CPU, memory, uptime, version.
    pub async fn resource(&mut self) -> RouterResult<Record> {
        self.single("/system/resource/print").await
    }

    /// Router identity name.
    pub async fn identity(&mut self) -> RouterResult<Record> {
        self.single("/system/identity/print").await
    }

    /// Router clock.
    pub async fn clock(&mut self) -> RouterResult<Record> {
        self.single("/system/clock/print").await
    }

    /// RouterBOARD model and firmware.
    pub async fn routerboard(&mut self) -> RouterResult<Record> {
        self.single("/system/routerboard/print").await
    }

    /// All interfaces.
    pub async fn interfaces(&mut self) -> RouterResult<Vec<Record>> {
        self.conn
            .write(&format!("{}/print", ResourceKind::INTERFACE.path), Vec::new())
            .await
    }

    /// One traffic sample for `interface`.
    pub async fn monitor_traffic(&mut self, interface: &str) -> RouterResult<Record> {
        let command = Command::new("/interface/monitor-traffic")
            .attr("interface", interface)
            .word(Word::Directive("once".to_string()));
        let mut records = self.conn.execute(&command).await?.records;
        if records.is_empty() {
            return Err(RouterError::MissingData("traffic sample"));
        }
        Ok(records.swap_remove(0))
    }
}
