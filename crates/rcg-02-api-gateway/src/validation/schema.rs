//! Declarative schemas over JSON input.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// All violations found in one input, joined for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
    /// One message per violated field
    pub messages: Vec<String>,
}

impl ValidationError {
    fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}

/// Accepted shape of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// String with a character-count range.
    Text { min: usize, max: usize },
    /// Integer range; numeric strings are coerced.
    Integer { min: i64, max: i64 },
    /// `true`/`false`; `"true"`/`"false"` are coerced.
    Boolean,
    /// One of a fixed set of strings.
    OneOf(&'static [&'static str]),
    /// `AA:BB:CC:DD:EE:FF`
    MacAddress,
}

/// Rule for one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// JSON field name
    pub name: &'static str,
    /// Absent and `null` are violations when set
    pub required: bool,
    /// Accepted shape
    pub kind: FieldKind,
}

impl FieldRule {
    /// Check (and coerce) one present value.
    fn check(&self, value: &mut Value) -> Result<(), String> {
        let name = self.name;
        match &self.kind {
            FieldKind::Text { min, max } => {
                let Some(s) = value.as_str() else {
                    return Err(format!("{name} must be a string"));
                };
                let len = s.chars().count();
                if len < *min {
                    if *min == 1 {
                        Err(format!("{name} is required"))
                    } else {
                        Err(format!("{name} must be at least {min} characters"))
                    }
                } else if len > *max {
                    Err(format!("{name} must be at most {max} characters"))
                } else {
                    Ok(())
                }
            }
            FieldKind::Integer { min, max } => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                let Some(n) = parsed else {
                    return Err(format!("{name} must be an integer"));
                };
                if n < *min || n > *max {
                    return Err(format!("{name} must be between {min} and {max}"));
                }
                *value = Value::from(n);
                Ok(())
            }
            FieldKind::Boolean => {
                let parsed = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) if s == "true" => Some(true),
                    Value::String(s) if s == "false" => Some(false),
                    _ => None,
                };
                let Some(b) = parsed else {
                    return Err(format!("{name} must be a boolean"));
                };
                *value = Value::Bool(b);
                Ok(())
            }
            FieldKind::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(()),
                _ => Err(format!("{name} must be one of: {}", allowed.join(", "))),
            },
            FieldKind::MacAddress => match value.as_str() {
                Some(s) if is_mac_address(s) => Ok(()),
                _ => Err(format!("{name} must be a MAC address like AA:BB:CC:DD:EE:FF")),
            },
        }
    }
}

fn is_mac_address(s: &str) -> bool {
    s.len() == 17
        && s.split(':').count() == 6
        && s
            .split(':')
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Field rules for one command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: &'static str,
    fields: Vec<FieldRule>,
}

impl Schema {
    /// Empty schema.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Add a required field.
    pub fn required(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name,
            required: true,
            kind,
        });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name,
            required: false,
            kind,
        });
        self
    }

    /// Same fields, none required; for partial updates.
    pub fn partial(&self) -> Self {
        Self {
            name: self.name,
            fields: self
                .fields
                .iter()
                .cloned()
                .map(|rule| FieldRule {
                    required: false,
                    ..rule
                })
                .collect(),
        }
    }

    /// Schema name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields.
    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Check every field, coercing numeric and boolean strings in place.
    ///
    /// `null` counts as absent. Fields the schema does not declare are left
    /// untouched.
    pub fn check(&self, input: &mut Value) -> Result<(), ValidationError> {
        let Some(object) = input.as_object_mut() else {
            return Err(ValidationError::single("request body must be a JSON object"));
        };

        let messages: Vec<String> = self
            .fields
            .iter()
            .filter_map(|rule| check_field(rule, object).err())
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { messages })
        }
    }
}

fn check_field(rule: &FieldRule, object: &mut Map<String, Value>) -> Result<(), String> {
    if matches!(object.get(rule.name), None | Some(Value::Null)) {
        object.remove(rule.name);
        return if rule.required {
            Err(format!("{} is required", rule.name))
        } else {
            Ok(())
        };
    }
    match object.get_mut(rule.name) {
        Some(value) => rule.check(value),
        None => Ok(()),
    }
}

/// Run `schema` over `input` and deserialize the result.
pub fn validate<T: DeserializeOwned>(schema: &Schema, mut input: Value) -> Result<T, ValidationError> {
    schema.check(&mut input)?;
    serde_json::from_value(input).map_err(|e| {
        tracing::debug!(schema = schema.name(), error = %e, "validated input did not deserialize");
        ValidationError::single(format!("invalid {} input", schema.name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Target {
        host: String,
        port: u16,
        #[serde(default)]
        tls: Option<bool>,
    }

    fn schema() -> Schema {
        Schema::new("target")
            .required("host", FieldKind::Text { min: 1, max: 253 })
            .required("port", FieldKind::Integer { min: 1, max: 65535 })
            .optional("tls", FieldKind::Boolean)
            .optional("mode", FieldKind::OneOf(&["a", "b"]))
    }

    #[test]
    fn test_valid_input_with_coercion() {
        let target: Target =
            validate(&schema(), json!({"host": "10.0.0.1", "port": "8729", "tls": "true"}))
                .unwrap();
        assert_eq!(
            target,
            Target {
                host: "10.0.0.1".into(),
                port: 8729,
                tls: Some(true)
            }
        );
    }

    #[test]
    fn test_port_out_of_range() {
        let err = validate::<Target>(&schema(), json!({"host": "r1", "port": 99999})).unwrap_err();
        assert_eq!(err.messages, vec!["port must be between 1 and 65535"]);
    }

    #[test]
    fn test_all_violations_joined() {
        let err = validate::<Target>(
            &schema(),
            json!({"host": "", "port": 0, "tls": 3, "mode": "c"}),
        )
        .unwrap_err();
        assert_eq!(err.messages.len(), 4);
        assert_eq!(
            err.to_string(),
            "host is required; port must be between 1 and 65535; tls must be a boolean; mode must be one of: a, b"
        );
    }

    #[test]
    fn test_null_is_absent() {
        let err = validate::<Target>(&schema(), json!({"host": null, "port": 1})).unwrap_err();
        assert_eq!(err.messages, vec!["host is required"]);

        let ok: Target = validate(&schema(), json!({"host": "h", "port": 1, "tls": null})).unwrap();
        assert_eq!(ok.tls, None);
    }

    #[test]
    fn test_partial_keeps_bounds() {
        let partial = schema().partial();
        assert!(partial.check(&mut json!({})).is_ok());
        assert!(partial.check(&mut json!({"port": 0})).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate::<Target>(&schema(), json!([1, 2])).is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        let schema = Schema::new("s").required("name", FieldKind::Text { min: 1, max: 3 });
        assert!(schema.check(&mut json!({"name": "äöü"})).is_ok());
        assert!(schema.check(&mut json!({"name": "äöüß"})).is_err());
    }

    #[test]
    fn test_mac_address() {
        let schema = Schema::new("s").required("mac", FieldKind::MacAddress);
        assert!(schema.check(&mut json!({"mac": "4C:5E:0C:12:AB:ef"})).is_ok());
        assert!(schema.check(&mut json!({"mac": "4C:5E:0C:12:AB"})).is_err());
        assert!(schema.check(&mut json!({"mac": "4C-5E-0C-12-AB-EF"})).is_err());
    }
}
