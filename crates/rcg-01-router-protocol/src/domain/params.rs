//! Typed command parameters.
//!
//! Every mutating operation takes a parameter struct whose fields are all
//! optional. The struct declares its router-side keys once, and
//! [`assignment_words`] turns the defined fields into `=key=value` words.
//! Undefined fields produce no word at all.

use serde::{Deserialize, Serialize};

use crate::domain::word::Word;

/// Value that can be stringified into an assignment word.
pub trait ParamValue {
    /// Router-side rendering, `None` when the field is undefined.
    fn to_param(&self) -> Option<String>;
}

impl ParamValue for String {
    fn to_param(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl ParamValue for bool {
    fn to_param(&self) -> Option<String> {
        Some(if *self { "yes" } else { "no" }.to_string())
    }
}

macro_rules! numeric_param {
    ($($ty:ty),*) => {
        $(impl ParamValue for $ty {
            fn to_param(&self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

numeric_param!(u16, u32, u64, i64);

impl<T: ParamValue> ParamValue for Option<T> {
    fn to_param(&self) -> Option<String> {
        self.as_ref().and_then(ParamValue::to_param)
    }
}

/// Parameter object with a declared field list.
pub trait CommandParams {
    /// `(router key, rendered value)` for every declared field, in
    /// declaration order.
    fn fields(&self) -> Vec<(&'static str, Option<String>)>;
}

/// One assignment word per defined field.
pub fn assignment_words<P: CommandParams + ?Sized>(params: &P) -> Vec<Word> {
    params
        .fields()
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| Word::attr(key, v)))
        .collect()
}

/// Parameters for resources that take none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

impl CommandParams for NoParams {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }
}

macro_rules! command_params {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty => $key:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl CommandParams for $name {
            fn fields(&self) -> Vec<(&'static str, Option<String>)> {
                vec![$(($key, self.$field.to_param())),*]
            }
        }
    };
}

command_params! {
    /// `/ip/hotspot/user` fields.
    HotspotUserParams {
        name: String => "name",
        password: String => "password",
        profile: String => "profile",
        server: String => "server",
        mac_address: String => "mac-address",
        /// RouterOS duration, e.g. `1h30m`.
        limit_uptime: String => "limit-uptime",
        limit_bytes_total: u64 => "limit-bytes-total",
        comment: String => "comment",
        disabled: bool => "disabled",
    }
}

command_params! {
    /// `/ip/hotspot/user/profile` fields.
    HotspotProfileParams {
        name: String => "name",
        shared_users: u32 => "shared-users",
        /// `rx/tx` rate, e.g. `2M/4M`.
        rate_limit: String => "rate-limit",
        session_timeout: String => "session-timeout",
        idle_timeout: String => "idle-timeout",
        keepalive_timeout: String => "keepalive-timeout",
        address_pool: String => "address-pool",
    }
}

command_params! {
    /// `/ip/hotspot/ip-binding` fields.
    IpBindingParams {
        mac_address: String => "mac-address",
        address: String => "address",
        to_address: String => "to-address",
        server: String => "server",
        /// `regular`, `bypassed` or `blocked`.
        #[serde(rename = "type")]
        binding_type: String => "type",
        comment: String => "comment",
        disabled: bool => "disabled",
    }
}

command_params! {
    /// `/ppp/secret` fields.
    PppSecretParams {
        name: String => "name",
        password: String => "password",
        service: String => "service",
        profile: String => "profile",
        local_address: String => "local-address",
        remote_address: String => "remote-address",
        comment: String => "comment",
        disabled: bool => "disabled",
    }
}

command_params! {
    /// `/ppp/profile` fields.
    PppProfileParams {
        name: String => "name",
        local_address: String => "local-address",
        remote_address: String => "remote-address",
        rate_limit: String => "rate-limit",
        dns_server: String => "dns-server",
        only_one: bool => "only-one",
    }
}

command_params! {
    /// `/ip/dhcp-server/lease` fields.
    DhcpLeaseParams {
        address: String => "address",
        mac_address: String => "mac-address",
        server: String => "server",
        client_id: String => "client-id",
        comment: String => "comment",
        disabled: bool => "disabled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<P: CommandParams>(params: &P) -> Vec<String> {
        assignment_words(params).iter().map(Word::encode).collect()
    }

    #[test]
    fn test_undefined_fields_are_omitted() {
        let params = HotspotUserParams {
            name: Some("vc1234".into()),
            password: Some("vc1234".into()),
            profile: Some("default".into()),
            comment: None,
            ..Default::default()
        };
        assert_eq!(
            encoded(&params),
            vec!["=name=vc1234", "=password=vc1234", "=profile=default"]
        );
    }

    #[test]
    fn test_empty_string_is_sent() {
        let params = HotspotUserParams {
            comment: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(encoded(&params), vec!["=comment="]);
    }

    #[test]
    fn test_value_rendering() {
        let params = HotspotUserParams {
            limit_bytes_total: Some(1_073_741_824),
            disabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            encoded(&params),
            vec!["=limit-bytes-total=1073741824", "=disabled=no"]
        );

        let binding = IpBindingParams {
            binding_type: Some("bypassed".into()),
            ..Default::default()
        };
        assert_eq!(encoded(&binding), vec!["=type=bypassed"]);
    }

    #[test]
    fn test_no_params() {
        assert!(assignment_words(&NoParams).is_empty());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let params: PppSecretParams =
            serde_json::from_str(r#"{"name":"alice","service":"pppoe"}"#).unwrap();
        assert_eq!(encoded(&params), vec!["=name=alice", "=service=pppoe"]);
    }
}
