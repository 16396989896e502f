//! Ferryman - Slack-Matrix message normalization
//!
//! Translates Slack markup, mentions and attachments into Matrix plain and
//! HTML bodies, translates Matrix HTML back into Slack markup, and tags
//! relayed messages so the bridge can recognize its own echoes.

pub mod bridge;
pub mod common;
pub mod config;
pub mod format;
pub mod markup;
pub mod platform;

pub use bridge::Bridge;
pub use common::error::{AppError, ConfigError, LookupError, NormalizeError};
pub use platform::{IdentityMap, PlatformLookup, StaticDirectory};
