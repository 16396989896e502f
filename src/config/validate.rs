//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;

use crate::common::error::ConfigError;
use crate::common::types::NotifyMode;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Bridge identity
    let team = &config.bridge.team_name;
    if team.is_empty() {
        errors.push("bridge.team_name is required".to_string());
    } else if team.contains(|c: char| c.is_whitespace() || c == ':') {
        errors.push(format!(
            "bridge.team_name '{}' may not contain whitespace or ':'",
            team
        ));
    }
    if config.bridge.homeserver.is_empty() {
        errors.push("bridge.homeserver is required".to_string());
    }
    if let Some(ref notify) = config.bridge.notify {
        if NotifyMode::from_name(notify).is_none() {
            errors.push(format!(
                "bridge.notify '{}' is invalid (use: channel, only_active)",
                notify
            ));
        }
    }

    // Puppet
    let puppet = &config.puppet;
    if puppet.id.is_empty() {
        errors.push("puppet.id is required".to_string());
    } else {
        match puppet.id.strip_prefix('@').and_then(|rest| rest.split_once(':')) {
            Some((localpart, server)) if !localpart.is_empty() && !server.is_empty() => {
                if !puppet.localpart.is_empty() && localpart != puppet.localpart {
                    errors.push(format!(
                        "puppet.localpart '{}' does not match puppet.id '{}'",
                        puppet.localpart, puppet.id
                    ));
                }
            }
            _ => errors.push(format!(
                "puppet.id '{}' must look like @localpart:server",
                puppet.id
            )),
        }
    }
    if puppet.localpart.is_empty() {
        errors.push("puppet.localpart is required".to_string());
    }

    if config.slack.self_id.is_empty() {
        errors.push("slack.self_id is required".to_string());
    }

    // Directory entries
    if let Some(ref directory) = config.directory {
        let sections = [
            (
                "users",
                directory
                    .users
                    .iter()
                    .flatten()
                    .map(|u| u.id.as_str())
                    .collect::<Vec<_>>(),
            ),
            (
                "channels",
                directory
                    .channels
                    .iter()
                    .flatten()
                    .map(|c| c.id.as_str())
                    .collect(),
            ),
            (
                "bots",
                directory.bots.iter().flatten().map(|b| b.id.as_str()).collect(),
            ),
        ];
        for (section, ids) in sections {
            let mut seen = HashSet::new();
            for (i, id) in ids.into_iter().enumerate() {
                if id.is_empty() {
                    errors.push(format!("directory.{}[{}].id is required", section, i));
                } else if !seen.insert(id) {
                    errors.push(format!(
                        "directory.{}[{}].id '{}' is a duplicate",
                        section, i, id
                    ));
                }
            }
        }
    }

    if let Some(ref pipeline) = config.pipeline {
        if pipeline.concurrency == Some(0) {
            errors.push("pipeline.concurrency must be non-zero".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
