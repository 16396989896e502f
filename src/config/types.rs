//! Configuration type definitions.

use serde::Deserialize;

use crate::common::types::NotifyMode;

/// Default number of requests the driver normalizes concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub puppet: PuppetConfig,
    pub slack: SlackConfig,
    pub directory: Option<DirectoryConfig>,
    pub pipeline: Option<PipelineConfig>,
}

impl Config {
    /// Broadcast translation mode, defaulting to `channel`.
    pub fn notify_mode(&self) -> NotifyMode {
        self.bridge
            .notify
            .as_deref()
            .and_then(NotifyMode::from_name)
            .unwrap_or_default()
    }

    /// How many driver requests may be in flight at once.
    pub fn concurrency(&self) -> usize {
        self.pipeline
            .as_ref()
            .and_then(|p| p.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }
}

/// Bridge identity settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Slack team name, part of every ghost user id and room alias.
    pub team_name: String,
    /// Matrix server name ghosts and aliases live on.
    pub homeserver: String,
    /// "channel" or "only_active"
    pub notify: Option<String>,
}

/// The Matrix account puppeting the Slack user.
#[derive(Debug, Clone, Deserialize)]
pub struct PuppetConfig {
    /// Full Matrix id, e.g. `@alice:example.org`.
    pub id: String,
    pub localpart: String,
}

/// Slack side of the puppet.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// The puppeted account's Slack user id.
    pub self_id: String,
}

/// Static user/channel/bot directory served to the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfig {
    pub users: Option<Vec<UserEntry>>,
    pub channels: Option<Vec<ChannelEntry>>,
    pub bots: Option<Vec<BotEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotEntry {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Driver tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub concurrency: Option<usize>,
}
