//! Echo detection for messages the bridge relayed itself.
//!
//! Everything the bridge sends to Slack ends with an invisible separator.
//! When Slack hands such a message back, the tag identifies it as an echo.

use std::path::Path;

/// U+2063 INVISIBLE SEPARATOR.
pub const ECHO_TAG: char = '\u{2063}';

/// What to do with an inbound message, judged by author and tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoVerdict {
    /// Someone else wrote it.
    Deliver,
    /// The puppeted account wrote it from a regular Slack client.
    Notice,
    /// The bridge's own relayed message came back.
    Echo,
    /// Self-authored with no text, so its origin cannot be told.
    UnknownOrigin,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTagger;

impl EchoTagger {
    pub fn new() -> Self {
        Self
    }

    /// Append the tag. Tagging twice is a no-op.
    pub fn tag(&self, text: &str) -> String {
        if self.is_tagged(text) {
            return text.to_string();
        }
        let mut tagged = String::with_capacity(text.len() + ECHO_TAG.len_utf8());
        tagged.push_str(text);
        tagged.push(ECHO_TAG);
        tagged
    }

    /// Whether the text, ignoring trailing whitespace, ends with the tag.
    pub fn is_tagged(&self, text: &str) -> bool {
        text.trim_end().ends_with(ECHO_TAG)
    }

    pub fn tag_filename(&self, name: &str) -> String {
        self.tag(name)
    }

    /// Whether the last component of `path` carries the tag.
    pub fn is_tagged_filename(&self, path: &str) -> bool {
        Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| self.is_tagged(name))
    }

    /// `sender_id` is `None` when the bridge's own account sent the message.
    pub fn classify(&self, sender_id: Option<&str>, text: &str) -> EchoVerdict {
        match sender_id {
            Some(_) => EchoVerdict::Deliver,
            None if text.trim().is_empty() => EchoVerdict::UnknownOrigin,
            None if self.is_tagged(text) => EchoVerdict::Echo,
            None => EchoVerdict::Notice,
        }
    }
}
