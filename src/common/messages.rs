//! Canonical message types for bridge communication.
//!
//! Inbound Slack events, the normalized output handed to the Matrix side,
//! and the request/response envelope spoken by the driver.

use serde::{Deserialize, Serialize};

use crate::common::types::{Attachment, FileRef};

/// A Slack `message` event as delivered by the RTM/Events API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackEvent {
    pub channel: String,
    pub subtype: Option<String>,
    #[serde(default)]
    pub text: String,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// New message body for `message_changed`.
    pub message: Option<EventMessage>,
    /// Old message body for `message_changed` and `message_deleted`.
    pub previous_message: Option<EventMessage>,
}

/// Nested message payload inside edit/delete events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: String,
    pub user: Option<String>,
}

/// A message ready for the Matrix side: a plain body and an HTML body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub room_id: String,
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub avatar_url: Option<String>,
    pub plain_text: String,
    /// `None` when normalization fell back to the raw text.
    pub html: Option<String>,
}

/// Inline preview of a snippet or post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub body: String,
    pub html: String,
}

/// A file to be re-uploaded on the Matrix side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDelivery {
    pub room_id: String,
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub avatar_url: Option<String>,
    pub filename: String,
    pub body: String,
    pub url: Option<String>,
    pub mimetype: Option<String>,
    pub snippet: Option<Snippet>,
}

/// Why an inbound event produced nothing to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The bridge's own relayed message came back.
    Echo,
    /// Self-authored with no body, so its origin cannot be told.
    UnknownOrigin,
    /// An edit that did not change the text.
    DuplicateEdit,
    /// Thread bookkeeping event.
    ThreadReply,
    /// Nothing to say.
    Empty,
}

/// Outcome of handling one inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    Message(NormalizedMessage),
    /// Written through the bridge's own account from another Slack client.
    Notice(NormalizedMessage),
    File(FileDelivery),
    Ignored { reason: IgnoreReason },
}

impl Delivery {
    pub fn ignored(reason: IgnoreReason) -> Self {
        Self::Ignored { reason }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }
}

/// One line of driver input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum BridgeRequest {
    /// A Slack event headed for Matrix.
    Inbound { event: SlackEvent },
    /// A Matrix message headed for Slack.
    Outbound {
        #[serde(default)]
        body: String,
        html: Option<String>,
        #[serde(default)]
        sender_is_self: bool,
    },
    /// Ask whether a body or filename carries the echo tag.
    EchoCheck { text: String },
}

/// One line of driver output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum BridgeResponse {
    Inbound { deliveries: Vec<Delivery> },
    Outbound { text: String },
    EchoCheck { echo: bool },
    Error { message: String },
}
