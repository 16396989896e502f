//! Lookup backed by the configured directory.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::common::error::LookupResult;
use crate::common::types::{BotProfile, ChannelInfo, UserProfile};
use crate::config::Config;
use crate::platform::PlatformLookup;

/// Fixed users, channels and bots, keyed by Slack id.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    self_id: String,
    users: HashMap<String, UserProfile>,
    channels: HashMap<String, ChannelInfo>,
    bots: HashMap<String, BotProfile>,
}

impl StaticDirectory {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            ..Default::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut directory = Self::new(config.slack.self_id.clone());
        let Some(entries) = config.directory.as_ref() else {
            return directory;
        };

        for user in entries.users.iter().flatten() {
            directory = directory.with_user(&user.id, &user.name, user.avatar_url.as_deref());
        }
        for channel in entries.channels.iter().flatten() {
            directory = directory.with_channel(&channel.id, &channel.name);
        }
        for bot in entries.bots.iter().flatten() {
            directory = directory.with_bot(&bot.id, &bot.name, bot.avatar_url.as_deref());
        }

        debug!(
            users = directory.users.len(),
            channels = directory.channels.len(),
            bots = directory.bots.len(),
            "Loaded static directory"
        );
        directory
    }

    pub fn with_user(mut self, id: &str, name: &str, avatar_url: Option<&str>) -> Self {
        self.users.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                name: name.to_string(),
                avatar_url: avatar_url.map(str::to_string),
            },
        );
        self
    }

    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.insert(
            id.to_string(),
            ChannelInfo {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_bot(mut self, id: &str, name: &str, avatar_url: Option<&str>) -> Self {
        self.bots.insert(
            id.to_string(),
            BotProfile {
                id: id.to_string(),
                name: name.to_string(),
                avatar_url: avatar_url.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl PlatformLookup for StaticDirectory {
    fn self_id(&self) -> &str {
        &self.self_id
    }

    async fn lookup_user(&self, id: &str) -> LookupResult<Option<UserProfile>> {
        Ok(self.users.get(id).cloned())
    }

    async fn lookup_channel(&self, id: &str) -> LookupResult<Option<ChannelInfo>> {
        Ok(self.channels.get(id).cloned())
    }

    async fn lookup_bot(&self, id: &str) -> LookupResult<Option<BotProfile>> {
        Ok(self.bots.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;

    #[tokio::test]
    async fn test_builder_lookups() {
        let directory = StaticDirectory::new("U0")
            .with_user("U1", "bob", Some("https://a/b.png"))
            .with_channel("C1", "general")
            .with_bot("B1", "deploybot", None);

        assert_eq!(directory.self_id(), "U0");
        let user = directory.lookup_user("U1").await.unwrap().unwrap();
        assert_eq!(user.name, "bob");
        assert_eq!(user.avatar_url.as_deref(), Some("https://a/b.png"));
        assert_eq!(
            directory.lookup_channel("C1").await.unwrap().map(|c| c.name),
            Some("general".to_string())
        );
        assert!(directory.lookup_bot("B1").await.unwrap().is_some());
        assert_eq!(directory.lookup_user("U404").await, Ok(None));
    }

    #[test]
    fn test_from_config() {
        let config = load_config_str(
            r#"
            bridge { team_name = "acme", homeserver = "example.org" }
            puppet { id = "@alice:example.org", localpart = "alice" }
            slack { self_id = "U0SELF" }
            directory {
              users = [ { id = "U1", name = "bob" } ]
              channels = [ { id = "C1", name = "general" } ]
            }
            "#,
        )
        .unwrap();

        let directory = StaticDirectory::from_config(&config);
        assert_eq!(directory.self_id(), "U0SELF");
        let user = tokio_test::block_on(directory.lookup_user("U1")).unwrap();
        assert_eq!(user.map(|u| u.name), Some("bob".to_string()));
        let bot = tokio_test::block_on(directory.lookup_bot("B1")).unwrap();
        assert!(bot.is_none());
    }
}
