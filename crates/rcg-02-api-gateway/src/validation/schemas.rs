//! Schemas and typed inputs for every mutating command.

use lazy_static::lazy_static;
use rcg_01_router_protocol::ResourceAction;
use serde::Deserialize;
use shared_types::RouterCredential;

use super::schema::{FieldKind, Schema};
use crate::vouchers::VoucherMode;

const fn text(max: usize) -> FieldKind {
    FieldKind::Text { min: 0, max }
}

const fn non_empty(max: usize) -> FieldKind {
    FieldKind::Text { min: 1, max }
}

const ADDRESS_LEN: usize = 45;
const COMMENT_LEN: usize = 255;
const NAME_LEN: usize = 64;

/// Values accepted by `/ppp/secret` `service`.
pub const PPP_SERVICES: &[&str] = &["any", "async", "l2tp", "ovpn", "pppoe", "pptp", "sstp"];
/// Values accepted by `/ip/hotspot/ip-binding` `type`.
pub const BINDING_TYPES: &[&str] = &["regular", "bypassed", "blocked"];
/// Single-item actions.
pub const RESOURCE_ACTIONS: &[&str] = &["enable", "disable", "remove"];
/// Voucher credential modes.
pub const VOUCHER_MODES: &[&str] = &["user-pass", "user-only"];

lazy_static! {
    /// Router inventory entry.
    pub static ref ROUTER: Schema = Schema::new("router")
        .optional("id", non_empty(shared_types::MAX_ROUTER_ID_LEN))
        .required("name", non_empty(NAME_LEN))
        .required("host", non_empty(253))
        .optional("port", FieldKind::Integer { min: 1, max: 65535 })
        .required("username", non_empty(NAME_LEN))
        .optional("password", text(128))
        .optional("currency", text(8))
        .optional("hotspot_name", text(NAME_LEN))
        .optional("dns_name", text(253));

    /// Opening a session against an inventory router.
    pub static ref SESSION_OPEN: Schema = Schema::new("session_open")
        .required("router_id", non_empty(shared_types::MAX_ROUTER_ID_LEN));

    /// Hotspot user.
    pub static ref HOTSPOT_USER: Schema = Schema::new("hotspot_user")
        .required("name", non_empty(NAME_LEN))
        .optional("password", text(NAME_LEN))
        .optional("profile", text(NAME_LEN))
        .optional("server", text(NAME_LEN))
        .optional("mac_address", FieldKind::MacAddress)
        .optional("limit_uptime", text(32))
        .optional("limit_bytes_total", FieldKind::Integer { min: 0, max: i64::MAX })
        .optional("comment", text(COMMENT_LEN))
        .optional("disabled", FieldKind::Boolean);

    /// Hotspot user profile.
    pub static ref HOTSPOT_PROFILE: Schema = Schema::new("hotspot_profile")
        .required("name", non_empty(NAME_LEN))
        .optional("shared_users", FieldKind::Integer { min: 1, max: 1000 })
        .optional("rate_limit", text(NAME_LEN))
        .optional("session_timeout", text(32))
        .optional("idle_timeout", text(32))
        .optional("keepalive_timeout", text(32))
        .optional("address_pool", text(NAME_LEN));

    /// PPP secret.
    pub static ref PPP_SECRET: Schema = Schema::new("ppp_secret")
        .required("name", non_empty(NAME_LEN))
        .optional("password", text(NAME_LEN))
        .optional("service", FieldKind::OneOf(PPP_SERVICES))
        .optional("profile", text(NAME_LEN))
        .optional("local_address", text(ADDRESS_LEN))
        .optional("remote_address", text(ADDRESS_LEN))
        .optional("comment", text(COMMENT_LEN))
        .optional("disabled", FieldKind::Boolean);

    /// PPP profile.
    pub static ref PPP_PROFILE: Schema = Schema::new("ppp_profile")
        .required("name", non_empty(NAME_LEN))
        .optional("local_address", text(ADDRESS_LEN))
        .optional("remote_address", text(ADDRESS_LEN))
        .optional("rate_limit", text(NAME_LEN))
        .optional("dns_server", text(253))
        .optional("only_one", FieldKind::Boolean);

    /// DHCP lease.
    pub static ref DHCP_LEASE: Schema = Schema::new("dhcp_lease")
        .required("address", non_empty(ADDRESS_LEN))
        .required("mac_address", FieldKind::MacAddress)
        .optional("server", text(NAME_LEN))
        .optional("client_id", text(NAME_LEN))
        .optional("comment", text(COMMENT_LEN))
        .optional("disabled", FieldKind::Boolean);

    /// Hotspot IP binding.
    pub static ref IP_BINDING: Schema = Schema::new("ip_binding")
        .optional("mac_address", FieldKind::MacAddress)
        .optional("address", text(ADDRESS_LEN))
        .optional("to_address", text(ADDRESS_LEN))
        .optional("server", text(NAME_LEN))
        .optional("type", FieldKind::OneOf(BINDING_TYPES))
        .optional("comment", text(COMMENT_LEN))
        .optional("disabled", FieldKind::Boolean);

    /// Router-assigned item id (`*1F`).
    pub static ref ITEM: Schema = Schema::new("item")
        .required("id", non_empty(32));

    /// enable / disable / remove one item.
    pub static ref RESOURCE_ACTION: Schema = Schema::new("resource_action")
        .required("id", non_empty(32))
        .required("action", FieldKind::OneOf(RESOURCE_ACTIONS));

    /// Voucher batch generation.
    pub static ref VOUCHER_BATCH: Schema = Schema::new("voucher_batch")
        .required("quantity", FieldKind::Integer { min: 1, max: 500 })
        .optional("length", FieldKind::Integer { min: 4, max: 16 })
        .optional("prefix", text(8))
        .required("profile", non_empty(NAME_LEN))
        .optional("mode", FieldKind::OneOf(VOUCHER_MODES))
        .optional("server", text(NAME_LEN))
        .optional("limit_uptime", text(32))
        .optional("comment", text(COMMENT_LEN));

    /// Interface name for traffic sampling.
    pub static ref INTERFACE: Schema = Schema::new("interface")
        .required("interface", non_empty(NAME_LEN));
}

/// Router inventory entry as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterInput {
    /// Existing id to update; a new id is generated when absent.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Address or hostname of the API service.
    pub host: String,
    /// API port; the configured default when absent.
    pub port: Option<u16>,
    /// Login name.
    pub username: String,
    /// Login password; empty is allowed.
    #[serde(default)]
    pub password: String,
    /// Currency label for voucher prices.
    #[serde(default)]
    pub currency: String,
    /// Hotspot server label.
    pub hotspot_name: Option<String>,
    /// Hotspot DNS name label.
    pub dns_name: Option<String>,
}

impl RouterInput {
    /// Credential with `default_port` filled in.
    pub fn into_credential(self, default_port: u16) -> RouterCredential {
        RouterCredential {
            host: self.host.trim().to_string(),
            port: self.port.unwrap_or(default_port),
            username: self.username,
            password: self.password,
            name: self.name,
            currency: self.currency,
            hotspot_name: self.hotspot_name.filter(|s| !s.is_empty()),
            dns_name: self.dns_name.filter(|s| !s.is_empty()),
        }
    }
}

/// `POST /api/session`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionOpenInput {
    /// Inventory id of the router to log in to.
    pub router_id: String,
}

/// Single-item action.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceActionInput {
    pub id: String,
    pub action: ResourceAction,
}

/// `POST /api/vouchers`
#[derive(Debug, Clone, Deserialize)]
pub struct VoucherBatchInput {
    pub quantity: usize,
    #[serde(default = "default_code_length")]
    pub length: usize,
    #[serde(default)]
    pub prefix: String,
    pub profile: String,
    #[serde(default)]
    pub mode: VoucherMode,
    pub server: Option<String>,
    pub limit_uptime: Option<String>,
    pub comment: Option<String>,
}

fn default_code_length() -> usize {
    6
}

/// Traffic sample request.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceInput {
    pub interface: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use rcg_01_router_protocol::{HotspotUserParams, IpBindingParams, PppSecretParams};
    use serde_json::json;

    fn router_json() -> serde_json::Value {
        json!({
            "name": "Office",
            "host": "192.168.88.1",
            "port": 8728,
            "username": "admin",
            "password": "pw"
        })
    }

    #[test]
    fn test_router_port_range() {
        let mut input = router_json();
        input["port"] = json!(99999);
        let err = validate::<RouterInput>(&ROUTER, input).unwrap_err();
        assert!(err.to_string().contains("port must be between 1 and 65535"));
    }

    #[test]
    fn test_router_default_port() {
        let mut input = router_json();
        input.as_object_mut().unwrap().remove("port");
        let credential = validate::<RouterInput>(&ROUTER, input)
            .unwrap()
            .into_credential(8729);
        assert_eq!(credential.port, 8729);
        assert!(credential.check().is_ok());
    }

    #[test]
    fn test_hotspot_user_into_params() {
        let params: HotspotUserParams = validate(
            &HOTSPOT_USER,
            json!({"name": "vc1", "limit_bytes_total": "1024", "disabled": false}),
        )
        .unwrap();
        assert_eq!(params.limit_bytes_total, Some(1024));
        assert_eq!(params.disabled, Some(false));

        assert!(validate::<HotspotUserParams>(&HOTSPOT_USER, json!({"password": "x"})).is_err());
        assert!(validate::<HotspotUserParams>(&HOTSPOT_USER.partial(), json!({"password": "x"})).is_ok());
    }

    #[test]
    fn test_ppp_service_enum() {
        assert!(validate::<PppSecretParams>(&PPP_SECRET, json!({"name": "a", "service": "pppoe"})).is_ok());
        let err = validate::<PppSecretParams>(&PPP_SECRET, json!({"name": "a", "service": "gre"}))
            .unwrap_err();
        assert!(err.to_string().starts_with("service must be one of"));
    }

    #[test]
    fn test_ip_binding_type_field() {
        let params: IpBindingParams =
            validate(&IP_BINDING, json!({"mac_address": "00:11:22:33:44:55", "type": "bypassed"}))
                .unwrap();
        assert_eq!(params.binding_type.as_deref(), Some("bypassed"));
        assert!(validate::<IpBindingParams>(&IP_BINDING, json!({"type": "allow"})).is_err());
    }

    #[test]
    fn test_resource_action() {
        let input: ResourceActionInput =
            validate(&RESOURCE_ACTION, json!({"id": "*1F", "action": "disable"})).unwrap();
        assert_eq!(input.action, ResourceAction::Disable);
        assert!(validate::<ResourceActionInput>(&RESOURCE_ACTION, json!({"id": "*1", "action": "reboot"})).is_err());
    }

    #[test]
    fn test_voucher_batch_bounds() {
        let input: VoucherBatchInput =
            validate(&VOUCHER_BATCH, json!({"quantity": 10, "profile": "1h"})).unwrap();
        assert_eq!(input.length, 6);
        assert_eq!(input.mode, VoucherMode::UserPass);

        let err = validate::<VoucherBatchInput>(
            &VOUCHER_BATCH,
            json!({"quantity": 501, "length": 3, "prefix": "TOOLONGPFX", "profile": ""}),
        )
        .unwrap_err();
        assert_eq!(err.messages.len(), 4);
    }

    #[test]
    fn test_dhcp_lease_requires_mac() {
        let err = validate::<rcg_01_router_protocol::DhcpLeaseParams>(
            &DHCP_LEASE,
            json!({"address": "10.0.0.50"}),
        )
        .unwrap_err();
        assert_eq!(err.messages, vec!["mac_address is required"]);
    }
}
