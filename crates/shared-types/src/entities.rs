//! # Core Domain Entities
//!
//! - **RouterId**: inventory key of one manageable router
//! - **RouterCredential**: everything needed to log in to the router API,
//!   plus the display labels the dashboard keeps next to it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CredentialError;

/// Default TCP port of the RouterOS API service.
pub const DEFAULT_API_PORT: u16 = 8728;

/// Maximum length of a router identifier.
pub const MAX_ROUTER_ID_LEN: usize = 64;

/// Maximum DNS host name length.
const MAX_HOST_LEN: usize = 253;

/// Inventory identifier of a router.
///
/// Restricted to ASCII alphanumerics, `-` and `_` so it can travel in URL
/// paths and session payloads without escaping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouterId(String);

impl RouterId {
    /// Parse and validate an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, CredentialError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_ROUTER_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(CredentialError::InvalidRouterId(id))
        }
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RouterId {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RouterId> for String {
    fn from(id: RouterId) -> Self {
        id.0
    }
}

/// Login material and display labels for one router.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterCredential {
    /// API host name or address.
    pub host: String,
    /// API port (8728 unless configured otherwise).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login principal.
    pub username: String,
    /// Login secret.
    #[serde(default)]
    pub password: String,
    /// Name shown in the dashboard.
    #[serde(default)]
    pub name: String,
    /// Currency label for voucher prices.
    #[serde(default)]
    pub currency: String,
    /// Hotspot server label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_name: Option<String>,
    /// Hotspot DNS name label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_API_PORT
}

impl RouterCredential {
    /// Minimal credential with the default API port.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_API_PORT,
            username: username.into(),
            password: password.into(),
            name: String::new(),
            currency: String::new(),
            hotspot_name: None,
            dns_name: None,
        }
    }

    /// Structural check applied to every credential read back from an
    /// untrusted carrier (session token, inventory file).
    pub fn check(&self) -> Result<(), CredentialError> {
        if self.host.trim().is_empty() || self.host.len() > MAX_HOST_LEN {
            return Err(CredentialError::InvalidHost);
        }
        if self.port == 0 {
            return Err(CredentialError::InvalidPort);
        }
        if self.username.trim().is_empty() {
            return Err(CredentialError::MissingUsername);
        }
        Ok(())
    }

    /// `host:port` pair for dialing.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            // bare IPv6 literal
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Display name, falling back to the host.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.host
        } else {
            &self.name
        }
    }
}

impl fmt::Debug for RouterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterCredential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("currency", &self.currency)
            .field("hotspot_name", &self.hotspot_name)
            .field("dns_name", &self.dns_name)
            .finish()
    }
}
