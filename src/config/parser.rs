//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;
use tracing::debug;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    load_config_str(&content)
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    resolve(HoconLoader::new().load_str(content).map_err(parse_error)?)
}

fn resolve(loader: HoconLoader) -> Result<Config, ConfigError> {
    let config: Config = loader.resolve().map_err(parse_error)?;
    debug!(team = %config.bridge.team_name, "Parsed configuration");
    Ok(config)
}

fn parse_error(e: hocon::Error) -> ConfigError {
    ConfigError::ParseError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::NotifyMode;

    const SAMPLE: &str = r#"
        bridge {
          team_name = "acme"
          homeserver = "example.org"
          notify = "only_active"
        }
        puppet {
          id = "@alice:example.org"
          localpart = "alice"
        }
        slack {
          self_id = "U0SELF"
        }
        directory {
          users = [
            { id = "U1", name = "bob" }
          ]
          channels = [
            { id = "C1", name = "general" }
          ]
        }
    "#;

    #[test]
    fn test_load_config_str() {
        let config = load_config_str(SAMPLE).unwrap();
        assert_eq!(config.bridge.team_name, "acme");
        assert_eq!(config.puppet.localpart, "alice");
        assert_eq!(config.slack.self_id, "U0SELF");
        assert_eq!(config.notify_mode(), NotifyMode::OnlyActive);

        let directory = config.directory.unwrap();
        assert_eq!(directory.users.unwrap()[0].name, "bob");
        assert_eq!(directory.channels.unwrap()[0].id, "C1");
        assert!(directory.bots.is_none());
    }

    #[test]
    fn test_missing_section_fails() {
        let result = load_config_str("bridge { team_name = \"acme\" }");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/nonexistent/ferryman.conf");
        assert!(matches!(
            result,
            Err(ConfigError::IoError { ref path, .. }) if path == "/nonexistent/ferryman.conf"
        ));
    }

    #[test]
    fn test_load_config_file() {
        let path = std::env::temp_dir().join(format!("ferryman-{}.conf", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let config = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap().bridge.homeserver, "example.org");
    }

    #[test]
    fn test_malformed_hocon_is_parse_error() {
        let result = load_config_str("bridge { team_name = ");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
