//! # Resource Operations
//!
//! Semantic operations per RouterOS menu, built only on
//! [`RouterConnection::execute`]. Each menu is described once by a
//! [`ResourceKind`]; [`Resource`] applies the common verbs to it with the
//! menu's typed parameter struct.

pub mod system;

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connection::RouterConnection;
use crate::domain::command::Command;
use crate::domain::params::{
    CommandParams, DhcpLeaseParams, HotspotProfileParams, HotspotUserParams, IpBindingParams,
    NoParams, PppProfileParams, PppSecretParams,
};
use crate::domain::reply::Record;
use crate::domain::word::Word;
use crate::error::{RouterError, RouterResult};

pub use system::SystemApi;

/// Static description of one RouterOS menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    /// Menu path, e.g. `/ip/hotspot/user`.
    pub path: &'static str,
    /// Accepts `add` and `set`.
    pub editable: bool,
    /// Accepts `remove`.
    pub removable: bool,
    /// Accepts `enable` and `disable`.
    pub toggleable: bool,
}

impl ResourceKind {
    pub const HOTSPOT_USER: Self = Self::full("/ip/hotspot/user");
    pub const HOTSPOT_PROFILE: Self = Self::crud("/ip/hotspot/user/profile");
    pub const HOTSPOT_ACTIVE: Self = Self::removable_only("/ip/hotspot/active");
    pub const HOTSPOT_SERVER: Self = Self::read_only("/ip/hotspot");
    pub const IP_BINDING: Self = Self::full("/ip/hotspot/ip-binding");
    pub const PPP_SECRET: Self = Self::full("/ppp/secret");
    pub const PPP_PROFILE: Self = Self::crud("/ppp/profile");
    pub const PPP_ACTIVE: Self = Self::removable_only("/ppp/active");
    pub const DHCP_LEASE: Self = Self::full("/ip/dhcp-server/lease");
    pub const INTERFACE: Self = Self::read_only("/interface");

    const fn full(path: &'static str) -> Self {
        Self {
            path,
            editable: true,
            removable: true,
            toggleable: true,
        }
    }

    const fn crud(path: &'static str) -> Self {
        Self {
            toggleable: false,
            ..Self::full(path)
        }
    }

    const fn removable_only(path: &'static str) -> Self {
        Self {
            path,
            editable: false,
            removable: true,
            toggleable: false,
        }
    }

    const fn read_only(path: &'static str) -> Self {
        Self {
            path,
            editable: false,
            removable: false,
            toggleable: false,
        }
    }

    /// Whether this menu offers `action`.
    pub fn permits(&self, action: ResourceAction) -> bool {
        match action {
            ResourceAction::Enable | ResourceAction::Disable => self.toggleable,
            ResourceAction::Remove => self.removable,
        }
    }

    /// Reject `action` on a menu that does not offer it, without any I/O.
    pub fn check(&self, action: ResourceAction) -> RouterResult<()> {
        self.require(self.permits(action), action.as_str())
    }

    fn command(&self, verb: &str) -> Command {
        Command::new(format!("{}/{}", self.path, verb))
    }

    fn require(&self, allowed: bool, operation: &'static str) -> RouterResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(RouterError::Unsupported {
                operation,
                resource: self.path,
            })
        }
    }
}

/// Single-item action shared by every toggleable or removable menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Enable,
    Disable,
    Remove,
}

impl ResourceAction {
    /// Lowercase verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Enable => "enable",
            ResourceAction::Disable => "disable",
            ResourceAction::Remove => "remove",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" => Ok(ResourceAction::Enable),
            "disable" => Ok(ResourceAction::Disable),
            "remove" => Ok(ResourceAction::Remove),
            other => Err(format!("unknown action {other:?}")),
        }
    }
}

/// Operations on one menu through a borrowed connection.
pub struct Resource<'c, P> {
    conn: &'c mut RouterConnection,
    kind: ResourceKind,
    _params: PhantomData<P>,
}

impl<'c, P: CommandParams> Resource<'c, P> {
    /// Bind `kind` to a connection.
    pub fn new(conn: &'c mut RouterConnection, kind: ResourceKind) -> Self {
        Self {
            conn,
            kind,
            _params: PhantomData,
        }
    }

    /// Menu description.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// `print`, optionally filtered by query words.
    pub async fn list(&mut self, filters: Vec<Word>) -> RouterResult<Vec<Record>> {
        let command = Command::with_words(format!("{}/print", self.kind.path), filters);
        Ok(self.conn.execute(&command).await?.records)
    }

    /// First entry whose `name` matches.
    pub async fn find_by_name(&mut self, name: &str) -> RouterResult<Option<Record>> {
        let mut records = self.list(vec![Word::query_eq("name", name)]).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    /// `add`; returns the id the router assigned.
    pub async fn add(&mut self, params: &P) -> RouterResult<String> {
        self.kind.require(self.kind.editable, "add")?;
        let reply = self
            .conn
            .execute(&self.kind.command("add").params(params))
            .await?;
        reply
            .ret()
            .map(str::to_string)
            .ok_or(RouterError::MissingData("id of the added entry"))
    }

    /// `set` on one entry; only defined fields change.
    pub async fn update(&mut self, id: &str, params: &P) -> RouterResult<()> {
        self.kind.require(self.kind.editable, "update")?;
        let command = self.kind.command("set").word(Word::id(id)).params(params);
        self.conn.execute(&command).await.map(drop)
    }

    /// `remove` one entry.
    pub async fn remove(&mut self, id: &str) -> RouterResult<()> {
        self.kind.check(ResourceAction::Remove)?;
        self.by_id("remove", id).await
    }

    /// `enable` one entry.
    pub async fn enable(&mut self, id: &str) -> RouterResult<()> {
        self.kind.check(ResourceAction::Enable)?;
        self.by_id("enable", id).await
    }

    /// `disable` one entry.
    pub async fn disable(&mut self, id: &str) -> RouterResult<()> {
        self.kind.check(ResourceAction::Disable)?;
        self.by_id("disable", id).await
    }

    /// Dispatch a [`ResourceAction`].
    pub async fn apply(&mut self, action: ResourceAction, id: &str) -> RouterResult<()> {
        match action {
            ResourceAction::Enable => self.enable(id).await,
            ResourceAction::Disable => self.disable(id).await,
            ResourceAction::Remove => self.remove(id).await,
        }
    }

    async fn by_id(&mut self, verb: &str, id: &str) -> RouterResult<()> {
        let command = self.kind.command(verb).word(Word::id(id));
        self.conn.execute(&command).await.map(drop)
    }
}

impl Resource<'_, HotspotUserParams> {
    /// Zero the uptime and byte counters of one user.
    pub async fn reset_counters(&mut self, id: &str) -> RouterResult<()> {
        self.by_id("reset-counters", id).await
    }
}

impl Resource<'_, DhcpLeaseParams> {
    /// Convert a dynamic lease into a static one.
    pub async fn make_static(&mut self, id: &str) -> RouterResult<()> {
        self.by_id("make-static", id).await
    }
}

impl RouterConnection {
    /// `/ip/hotspot/user`
    pub fn hotspot_users(&mut self) -> Resource<'_, HotspotUserParams> {
        Resource::new(self, ResourceKind::HOTSPOT_USER)
    }

    /// `/ip/hotspot/user/profile`
    pub fn hotspot_profiles(&mut self) -> Resource<'_, HotspotProfileParams> {
        Resource::new(self, ResourceKind::HOTSPOT_PROFILE)
    }

    /// `/ip/hotspot/active`
    pub fn hotspot_active(&mut self) -> Resource<'_, NoParams> {
        Resource::new(self, ResourceKind::HOTSPOT_ACTIVE)
    }

    /// `/ip/hotspot`
    pub fn hotspot_servers(&mut self) -> Resource<'_, NoParams> {
        Resource::new(self, ResourceKind::HOTSPOT_SERVER)
    }

    /// `/ip/hotspot/ip-binding`
    pub fn ip_bindings(&mut self) -> Resource<'_, IpBindingParams> {
        Resource::new(self, ResourceKind::IP_BINDING)
    }

    /// `/ppp/secret`
    pub fn ppp_secrets(&mut self) -> Resource<'_, PppSecretParams> {
        Resource::new(self, ResourceKind::PPP_SECRET)
    }

    /// `/ppp/profile`
    pub fn ppp_profiles(&mut self) -> Resource<'_, PppProfileParams> {
        Resource::new(self, ResourceKind::PPP_PROFILE)
    }

    /// `/ppp/active`
    pub fn ppp_active(&mut self) -> Resource<'_, NoParams> {
        Resource::new(self, ResourceKind::PPP_ACTIVE)
    }

    /// `/ip/dhcp-server/lease`
    pub fn dhcp_leases(&mut self) -> Resource<'_, DhcpLeaseParams> {
        Resource::new(self, ResourceKind::DHCP_LEASE)
    }

    /// System and interface reads.
    pub fn system(&mut self) -> SystemApi<'_> {
        SystemApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(ResourceKind::HOTSPOT_USER.toggleable);
        assert!(!ResourceKind::HOTSPOT_PROFILE.toggleable);
        assert!(ResourceKind::HOTSPOT_PROFILE.editable);
        assert!(ResourceKind::HOTSPOT_ACTIVE.removable);
        assert!(!ResourceKind::HOTSPOT_ACTIVE.editable);
        assert!(!ResourceKind::INTERFACE.removable);
    }

    #[test]
    fn test_permits_follows_capabilities() {
        let profiles = ResourceKind::HOTSPOT_PROFILE;
        assert!(profiles.permits(ResourceAction::Remove));
        assert!(!profiles.permits(ResourceAction::Enable));
        assert!(!profiles.permits(ResourceAction::Disable));

        let active = ResourceKind::PPP_ACTIVE;
        assert!(active.check(ResourceAction::Remove).is_ok());
        assert!(matches!(
            active.check(ResourceAction::Disable),
            Err(RouterError::Unsupported { operation: "disable", resource: "/ppp/active" })
        ));

        for action in [ResourceAction::Enable, ResourceAction::Disable, ResourceAction::Remove] {
            assert!(ResourceKind::DHCP_LEASE.permits(action));
            assert!(!ResourceKind::HOTSPOT_SERVER.permits(action));
        }
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("remove".parse::<ResourceAction>(), Ok(ResourceAction::Remove));
        assert!("reboot".parse::<ResourceAction>().is_err());
        assert_eq!(ResourceAction::Disable.to_string(), "disable");
    }

    #[tokio::test]
    async fn test_unsupported_operation_fails_before_io() {
        let mut conn = RouterConnection::new();
        let err = conn.hotspot_active().enable("*1").await.unwrap_err();
        assert!(matches!(
            err,
            RouterError::Unsupported { operation: "enable", resource: "/ip/hotspot/active" }
        ));

        let err = conn.hotspot_servers().remove("*1").await.unwrap_err();
        assert!(matches!(err, RouterError::Unsupported { .. }));
    }
}
