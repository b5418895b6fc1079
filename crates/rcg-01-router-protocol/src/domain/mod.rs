//! Protocol domain: words, commands, typed parameters and replies.

pub mod command;
pub mod params;
pub mod reply;
pub mod word;
