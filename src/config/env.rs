//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `FERRYMAN_TEAM_NAME` - Slack team name
//! - `FERRYMAN_HOMESERVER` - Matrix server name
//! - `FERRYMAN_NOTIFY` - `channel` or `only_active`
//! - `FERRYMAN_PUPPET_ID` - Matrix id of the puppet
//! - `FERRYMAN_PUPPET_LOCALPART` - Localpart of the puppet
//! - `FERRYMAN_SELF_ID` - Slack user id of the puppeted account
//! - `FERRYMAN_CONCURRENCY` - Driver concurrency

use std::env;

use crate::config::types::{Config, PipelineConfig};

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "FERRYMAN";

fn var(name: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Some(team) = var("TEAM_NAME") {
        config.bridge.team_name = team;
    }
    if let Some(homeserver) = var("HOMESERVER") {
        config.bridge.homeserver = homeserver;
    }
    if let Some(notify) = var("NOTIFY") {
        config.bridge.notify = Some(notify);
    }

    // Puppet identity
    if let Some(id) = var("PUPPET_ID") {
        config.puppet.id = id;
    }
    if let Some(localpart) = var("PUPPET_LOCALPART") {
        config.puppet.localpart = localpart;
    }
    if let Some(self_id) = var("SELF_ID") {
        config.slack.self_id = self_id;
    }

    if let Some(concurrency) = var("CONCURRENCY") {
        if let Ok(concurrency) = concurrency.parse() {
            config.pipeline = Some(PipelineConfig {
                concurrency: Some(concurrency),
            });
        }
    }

    config
}

/// Check if any identity environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_PUPPET_ID", ENV_PREFIX),
        format!("{}_PUPPET_LOCALPART", ENV_PREFIX),
        format!("{}_SELF_ID", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `FERRYMAN_CONFIG` environment variable, otherwise returns "ferryman.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "ferryman.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_test_config() -> Config {
        Config {
            bridge: BridgeConfig {
                team_name: "acme".to_string(),
                homeserver: "example.org".to_string(),
                notify: None,
            },
            puppet: PuppetConfig {
                id: "@alice:example.org".to_string(),
                localpart: "alice".to_string(),
            },
            slack: SlackConfig {
                self_id: "U0SELF".to_string(),
            },
            directory: None,
            pipeline: None,
        }
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "FERRYMAN");
    }

    #[test]
    fn test_get_config_path_default() {
        env::remove_var("FERRYMAN_CONFIG");
        assert_eq!(get_config_path(), "ferryman.conf");
    }

    #[test]
    fn test_apply_env_overrides_no_vars() {
        env::remove_var("FERRYMAN_TEAM_NAME");
        env::remove_var("FERRYMAN_PUPPET_ID");

        let result = apply_env_overrides(make_test_config());

        assert_eq!(result.bridge.team_name, "acme");
        assert_eq!(result.puppet.id, "@alice:example.org");
    }

    #[test]
    fn test_apply_env_overrides_concurrency() {
        env::set_var("FERRYMAN_CONCURRENCY", "3");
        let result = apply_env_overrides(make_test_config());
        env::remove_var("FERRYMAN_CONCURRENCY");

        assert_eq!(result.concurrency(), 3);
    }
}
