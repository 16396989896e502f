//! Shared types used across the application.

use serde::{Deserialize, Serialize};

/// A chat message handed to the normalization core by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Slack channel the message belongs to.
    pub room_id: String,
    /// Author's Slack id. `None` means the bridge's own account wrote it.
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub file: Option<FileRef>,
}

impl Message {
    /// Create a message with text only.
    pub fn new(room_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the author.
    pub fn with_sender(mut self, id: Option<&str>, name: impl Into<String>) -> Self {
        self.sender_id = id.map(str::to_string);
        self.sender_name = name.into();
        self
    }

    /// Attach structured attachments.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Whether the bridge's own account authored this message.
    pub fn is_self_authored(&self) -> bool {
        self.sender_id.is_none()
    }
}

/// Slack message attachment, in the shape Slack delivers it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub pretext: Option<String>,
    pub author_name: Option<String>,
    pub author_link: Option<String>,
    pub title: Option<String>,
    pub title_link: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub fields: Vec<AttachmentField>,
    #[serde(default)]
    pub actions: Vec<AttachmentAction>,
    pub footer: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentAction {
    pub text: Option<String>,
}

/// A shared file referenced by a Slack message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub title: Option<String>,
    /// Slack file mode: `hosted`, `external`, `snippet` or `post`.
    pub mode: Option<String>,
    pub filetype: Option<String>,
    pub mimetype: Option<String>,
    pub preview: Option<String>,
    #[serde(default)]
    pub lines_more: u32,
    pub url_private: Option<String>,
}

impl FileRef {
    /// Snippets and posts carry an inline text preview worth rendering.
    pub fn has_preview(&self) -> bool {
        matches!(self.mode.as_deref(), Some("snippet") | Some("post")) && self.preview.is_some()
    }
}

/// A Slack user as reported by the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A Slack channel as reported by the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

/// A Slack bot integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// How `@room` is translated when sending to Slack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifyMode {
    /// Notify every channel member (`<!channel>`).
    #[default]
    Channel,
    /// Notify only active members (`<!here>`).
    OnlyActive,
}

impl NotifyMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "channel" => Some(Self::Channel),
            "only_active" => Some(Self::OnlyActive),
            _ => None,
        }
    }

    /// The Slack broadcast token for this mode.
    pub fn slack_token(self) -> &'static str {
        match self {
            Self::Channel => "<!channel>",
            Self::OnlyActive => "<!here>",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_deserializes_slack_shape() {
        let json = r##"{
            "color": "#36a64f",
            "title": "Build 42",
            "fields": [{"title": "Status", "value": "green", "short": true}],
            "actions": [{"text": "Retry", "type": "button"}]
        }"##;
        let att: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(att.color.as_deref(), Some("#36a64f"));
        assert_eq!(att.fields[0].value.as_deref(), Some("green"));
        assert_eq!(att.actions[0].text.as_deref(), Some("Retry"));
        assert!(att.pretext.is_none());
    }

    #[test]
    fn test_file_preview_modes() {
        let mut file = FileRef {
            name: "notes.txt".to_string(),
            mode: Some("snippet".to_string()),
            preview: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(file.has_preview());

        file.mode = Some("hosted".to_string());
        assert!(!file.has_preview());
    }

    #[test]
    fn test_notify_mode_names() {
        assert_eq!(NotifyMode::from_name("channel"), Some(NotifyMode::Channel));
        assert_eq!(NotifyMode::from_name("ONLY_ACTIVE"), Some(NotifyMode::OnlyActive));
        assert_eq!(NotifyMode::from_name("everyone"), None);
        assert_eq!(NotifyMode::OnlyActive.slack_token(), "<!here>");
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::new("C1", "hi").with_sender(None, "me");
        assert!(msg.is_self_authored());
        assert_eq!(msg.room_id, "C1");
    }
}
