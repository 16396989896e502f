//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;
pub mod types;

pub use messages::{
    BridgeRequest, BridgeResponse, Delivery, EventMessage, FileDelivery, IgnoreReason,
    NormalizedMessage, SlackEvent, Snippet,
};
pub use types::{
    Attachment, AttachmentAction, AttachmentField, BotProfile, ChannelInfo, FileRef, Message,
    NotifyMode, UserProfile,
};
