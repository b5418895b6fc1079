//! Word expressions inside a command sentence.

use std::fmt;

/// One non-path word of a command sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    /// `=key=value`
    Attribute(String, String),
    /// `?expr`, a filter for `print`.
    Query(String),
    /// `=name=`, a valueless flag such as `once`.
    Directive(String),
    /// `=.proplist=a,b`
    ProplistFilter(Vec<String>),
}

impl Word {
    /// `=key=value`
    pub fn attr(key: impl Into<String>, value: impl Into<String>) -> Self {
        Word::Attribute(key.into(), value.into())
    }

    /// `?key=value`
    pub fn query_eq(key: &str, value: &str) -> Self {
        Word::Query(format!("{key}={value}"))
    }

    /// `=.id=<id>`
    pub fn id(id: impl Into<String>) -> Self {
        Word::Attribute(".id".to_string(), id.into())
    }

    /// Encoded form as sent on the wire.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Attribute(key, value) => write!(f, "={key}={value}"),
            Word::Query(expr) => write!(f, "?{expr}"),
            Word::Directive(name) => write!(f, "={name}="),
            Word::ProplistFilter(fields) => write!(f, "=.proplist={}", fields.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodings() {
        assert_eq!(Word::attr("name", "vc1").encode(), "=name=vc1");
        assert_eq!(Word::query_eq("name", "vc1").encode(), "?name=vc1");
        assert_eq!(Word::Directive("once".into()).encode(), "=once=");
        assert_eq!(
            Word::ProplistFilter(vec!["name".into(), "uptime".into()]).encode(),
            "=.proplist=name,uptime"
        );
        assert_eq!(Word::id("*1A").encode(), "=.id=*1A");
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(Word::attr("comment", "a=b").encode(), "=comment=a=b");
    }
}
