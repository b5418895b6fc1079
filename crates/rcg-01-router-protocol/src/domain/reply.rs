//! Reply sentences and the records they carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RouterError, RouterResult};

/// Reply sentence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `!re`, one data record.
    Re,
    /// `!done`, end of the reply batch.
    Done,
    /// `!trap`, the command failed.
    Trap,
    /// `!fatal`, the router is closing the session.
    Fatal,
    /// `!empty`, the command produced no records.
    Empty,
}

impl ReplyKind {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "!re" => Some(ReplyKind::Re),
            "!done" => Some(ReplyKind::Done),
            "!trap" => Some(ReplyKind::Trap),
            "!fatal" => Some(ReplyKind::Fatal),
            "!empty" => Some(ReplyKind::Empty),
            _ => None,
        }
    }
}

/// One decoded reply sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Sentence type.
    pub kind: ReplyKind,
    /// Correlation tag, when present.
    pub tag: Option<String>,
    /// `=key=value` words.
    pub attributes: BTreeMap<String, String>,
    /// Words that are neither attributes nor the tag (`!fatal` reason).
    pub extra: Vec<String>,
}

impl Sentence {
    /// Decode raw words; the first word must be a reply type.
    pub fn parse(words: Vec<String>) -> RouterResult<Self> {
        let mut words = words.into_iter();
        let head = words
            .next()
            .ok_or_else(|| RouterError::Protocol("empty reply sentence".to_string()))?;
        let kind = ReplyKind::parse(&head)
            .ok_or_else(|| RouterError::Protocol(format!("unknown reply type {head:?}")))?;

        let mut sentence = Sentence {
            kind,
            tag: None,
            attributes: BTreeMap::new(),
            extra: Vec::new(),
        };

        for word in words {
            if let Some(tag) = word.strip_prefix(".tag=") {
                sentence.tag = Some(tag.to_string());
            } else if let Some(body) = word.strip_prefix('=') {
                // key ends at the first '=' after the leading one
                match body.split_once('=') {
                    Some((key, value)) => {
                        sentence
                            .attributes
                            .insert(key.to_string(), value.to_string());
                    }
                    None => {
                        sentence.attributes.insert(body.to_string(), String::new());
                    }
                }
            } else {
                sentence.extra.push(word);
            }
        }

        Ok(sentence)
    }

    /// Attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Human-readable message of a `!trap` or `!fatal`.
    pub fn message(&self) -> String {
        match self.attr("message") {
            Some(message) => message.to_string(),
            None if !self.extra.is_empty() => self.extra.join(" "),
            None => "no message".to_string(),
        }
    }

    /// Convert a `!trap` into its error.
    pub fn into_trap(self) -> RouterError {
        let category = self.attr("category").and_then(|c| c.parse().ok());
        RouterError::Trap {
            category,
            message: self.message(),
        }
    }
}

/// One `!re` record: attribute name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// Wrap an attribute map.
    pub fn new(attributes: BTreeMap<String, String>) -> Self {
        Self(attributes)
    }

    /// Attribute lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Router-internal id (`.id`, e.g. `*1A`).
    pub fn id(&self) -> Option<&str> {
        self.get(".id")
    }

    /// Whether the record is flagged `disabled=true`.
    pub fn is_disabled(&self) -> bool {
        self.get("disabled") == Some("true")
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap the attribute map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Full reply batch of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// `!re` records in arrival order.
    pub records: Vec<Record>,
    /// Attributes carried by `!done`.
    pub done: BTreeMap<String, String>,
}

impl Reply {
    /// `=ret=` of the `!done` sentence (new id after `add`).
    pub fn ret(&self) -> Option<&str> {
        self.done.get("ret").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_record() {
        let s = Sentence::parse(words(&[
            "!re",
            "=.id=*1",
            "=name=vc1",
            "=comment=a=b",
            "=disabled=false",
            ".tag=4",
        ]))
        .unwrap();
        assert_eq!(s.kind, ReplyKind::Re);
        assert_eq!(s.tag.as_deref(), Some("4"));
        assert_eq!(s.attr(".id"), Some("*1"));
        assert_eq!(s.attr("comment"), Some("a=b"));
    }

    #[test]
    fn test_parse_trap() {
        let s = Sentence::parse(words(&[
            "!trap",
            "=category=1",
            "=message=failure: already have user with this name",
        ]))
        .unwrap();
        match s.into_trap() {
            RouterError::Trap { category, message } => {
                assert_eq!(category, Some(1));
                assert_eq!(message, "failure: already have user with this name");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fatal_reason_in_plain_word() {
        let s = Sentence::parse(words(&["!fatal", "session terminated on request"])).unwrap();
        assert_eq!(s.kind, ReplyKind::Fatal);
        assert_eq!(s.message(), "session terminated on request");
    }

    #[test]
    fn test_unknown_or_empty_rejected() {
        assert!(matches!(
            Sentence::parse(words(&["!weird"])),
            Err(RouterError::Protocol(_))
        ));
        assert!(matches!(Sentence::parse(Vec::new()), Err(RouterError::Protocol(_))));
    }

    #[test]
    fn test_record_helpers() {
        let record: Record = [
            (".id".to_string(), "*2".to_string()),
            ("disabled".to_string(), "true".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.id(), Some("*2"));
        assert!(record.is_disabled());
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{".id":"*2","disabled":"true"}"#
        );
    }
}
