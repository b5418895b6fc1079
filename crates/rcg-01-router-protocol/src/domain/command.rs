//! Command sentences.

use crate::domain::params::{assignment_words, CommandParams};
use crate::domain::word::Word;
use crate::error::{RouterError, RouterResult};

/// A target path plus its ordered words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    path: String,
    words: Vec<Word>,
}

impl Command {
    /// Start a command for `path`, e.g. `/ip/hotspot/user/print`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            words: Vec::new(),
        }
    }

    /// Command with a prepared word list.
    pub fn with_words(path: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            path: path.into(),
            words,
        }
    }

    /// Append a word.
    pub fn word(mut self, word: Word) -> Self {
        self.words.push(word);
        self
    }

    /// Append `=key=value`.
    pub fn attr(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.word(Word::attr(key, value))
    }

    /// Append one assignment per defined parameter field.
    pub fn params<P: CommandParams>(mut self, params: &P) -> Self {
        self.words.extend(assignment_words(params));
        self
    }

    /// Target path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Words after the path.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Reject paths the router could never accept, before any I/O.
    pub fn validate(&self) -> RouterResult<()> {
        let path = self.path.as_str();
        let valid = path.len() > 1
            && path.starts_with('/')
            && !path.ends_with('/')
            && !path.contains("//")
            && !path.chars().any(|c| c.is_whitespace() || c.is_control());
        if valid {
            Ok(())
        } else {
            Err(RouterError::InvalidPath(path.to_string()))
        }
    }

    /// Encoded sentence words, tagged for reply correlation.
    pub fn to_sentence(&self, tag: u32) -> Vec<String> {
        let mut sentence = Vec::with_capacity(self.words.len() + 2);
        sentence.push(self.path.clone());
        sentence.extend(self.words.iter().map(Word::encode));
        sentence.push(format!(".tag={tag}"));
        sentence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::HotspotUserParams;

    #[test]
    fn test_sentence_layout() {
        let cmd = Command::new("/ip/hotspot/user/set")
            .word(Word::id("*3"))
            .attr("disabled", "yes");
        assert_eq!(
            cmd.to_sentence(7),
            vec!["/ip/hotspot/user/set", "=.id=*3", "=disabled=yes", ".tag=7"]
        );
    }

    #[test]
    fn test_params_appended_in_declared_order() {
        let params = HotspotUserParams {
            name: Some("vc1".into()),
            profile: Some("1h".into()),
            ..Default::default()
        };
        let cmd = Command::new("/ip/hotspot/user/add").params(&params);
        let words: Vec<String> = cmd.words().iter().map(Word::encode).collect();
        assert_eq!(words, vec!["=name=vc1", "=profile=1h"]);
    }

    #[test]
    fn test_path_validation() {
        assert!(Command::new("/system/resource/print").validate().is_ok());
        for bad in ["", "/", "system/resource", "/ip//address", "/ip/address/", "/ip /x"] {
            assert!(
                matches!(Command::new(bad).validate(), Err(RouterError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
