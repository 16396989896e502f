//! Naming of Slack users and channels on the Matrix side.

use crate::config::Config;

/// Base of every Matrix permalink.
pub const MATRIX_TO: &str = "https://matrix.to/#/";

/// What a matrix.to link points at, seen from Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixLink {
    /// A ghost user, carrying the Slack user id.
    User(String),
    /// A bridged room alias, carrying the Slack channel id.
    Channel(String),
    /// The puppet account itself.
    Puppet,
}

/// Maps Slack ids to ghost users and room aliases and back.
///
/// Ghosts are `@slack_<team>_<id>:<domain>` and aliases
/// `#slack_<team>_<id>:<domain>`, all lowercase since Matrix localparts
/// must be. Slack ids are uppercase, so the reverse mapping uppercases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMap {
    prefix: String,
    domain: String,
    puppet_id: String,
    puppet_localpart: String,
}

impl IdentityMap {
    pub fn new(
        team_name: &str,
        domain: impl Into<String>,
        puppet_id: impl Into<String>,
        puppet_localpart: impl Into<String>,
    ) -> Self {
        Self {
            prefix: format!("slack_{}_", team_name.to_lowercase()),
            domain: domain.into(),
            puppet_id: puppet_id.into(),
            puppet_localpart: puppet_localpart.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.bridge.team_name,
            config.bridge.homeserver.clone(),
            config.puppet.id.clone(),
            config.puppet.localpart.clone(),
        )
    }

    pub fn puppet_id(&self) -> &str {
        &self.puppet_id
    }

    pub fn puppet_localpart(&self) -> &str {
        &self.puppet_localpart
    }

    pub fn puppet_url(&self) -> String {
        format!("{}{}", MATRIX_TO, self.puppet_id)
    }

    pub fn ghost_user_id(&self, slack_user: &str) -> String {
        format!("@{}{}:{}", self.prefix, slack_user.to_lowercase(), self.domain)
    }

    pub fn room_alias(&self, slack_channel: &str) -> String {
        format!("#{}{}:{}", self.prefix, slack_channel.to_lowercase(), self.domain)
    }

    /// Permalink to the ghost of a Slack user.
    pub fn profile_url(&self, slack_user: &str) -> String {
        format!("{}{}", MATRIX_TO, self.ghost_user_id(slack_user))
    }

    /// Permalink to the bridged room of a Slack channel.
    pub fn room_url(&self, slack_channel: &str) -> String {
        format!("{}{}", MATRIX_TO, self.room_alias(slack_channel))
    }

    /// Slack user id behind a ghost user id, if it is one of ours.
    pub fn slack_user_from_ghost(&self, matrix_id: &str) -> Option<String> {
        self.strip_local(matrix_id.strip_prefix('@')?)
    }

    /// Slack channel id behind a bridged room alias, if it is one of ours.
    pub fn slack_channel_from_alias(&self, alias: &str) -> Option<String> {
        self.strip_local(alias.strip_prefix('#')?)
    }

    fn strip_local(&self, id: &str) -> Option<String> {
        let (localpart, domain) = id.split_once(':')?;
        if !domain.eq_ignore_ascii_case(&self.domain) {
            return None;
        }
        let localpart = localpart.to_lowercase();
        let slack_id = localpart.strip_prefix(&self.prefix)?;
        if slack_id.is_empty() {
            None
        } else {
            Some(slack_id.to_uppercase())
        }
    }

    /// Classify a link target. Only matrix.to permalinks to our own ghosts,
    /// aliases or the puppet are recognized.
    pub fn resolve_link(&self, href: &str) -> Option<MatrixLink> {
        let target = href.trim().strip_prefix(MATRIX_TO)?;
        let target = target.split('?').next().unwrap_or(target);
        let target = percent_decode(target)?;

        if target == self.puppet_id {
            return Some(MatrixLink::Puppet);
        }
        match target.chars().next()? {
            '@' => self.slack_user_from_ghost(&target).map(MatrixLink::User),
            '#' => self.slack_channel_from_alias(&target).map(MatrixLink::Channel),
            _ => None,
        }
    }
}

/// Decode `%XX` escapes. Fails on malformed escapes or invalid UTF-8.
fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> IdentityMap {
        IdentityMap::new("Acme", "example.org", "@alice:example.org", "alice")
    }

    #[test]
    fn test_ghost_and_alias_naming() {
        let ids = identity();
        assert_eq!(ids.ghost_user_id("U1AB"), "@slack_acme_u1ab:example.org");
        assert_eq!(ids.room_alias("C9"), "#slack_acme_c9:example.org");
        assert_eq!(
            ids.profile_url("U1AB"),
            "https://matrix.to/#/@slack_acme_u1ab:example.org"
        );
        assert_eq!(ids.room_url("C9"), "https://matrix.to/#/#slack_acme_c9:example.org");
        assert_eq!(ids.puppet_url(), "https://matrix.to/#/@alice:example.org");
    }

    #[test]
    fn test_reverse_mapping() {
        let ids = identity();
        assert_eq!(
            ids.slack_user_from_ghost("@slack_acme_u1ab:example.org").as_deref(),
            Some("U1AB")
        );
        assert_eq!(
            ids.slack_channel_from_alias("#slack_acme_c9:example.org").as_deref(),
            Some("C9")
        );
        assert_eq!(ids.slack_user_from_ghost("@slack_other_u1:example.org"), None);
        assert_eq!(ids.slack_user_from_ghost("@slack_acme_u1:elsewhere.org"), None);
        assert_eq!(ids.slack_user_from_ghost("@slack_acme_:example.org"), None);
        assert_eq!(ids.slack_user_from_ghost("@bob:example.org"), None);
    }

    #[test]
    fn test_resolve_link() {
        let ids = identity();
        assert_eq!(
            ids.resolve_link("https://matrix.to/#/@slack_acme_u1:example.org"),
            Some(MatrixLink::User("U1".into()))
        );
        assert_eq!(
            ids.resolve_link("https://matrix.to/#/%40slack_acme_u1%3Aexample.org"),
            Some(MatrixLink::User("U1".into()))
        );
        assert_eq!(
            ids.resolve_link("https://matrix.to/#/#slack_acme_c1:example.org?via=example.org"),
            Some(MatrixLink::Channel("C1".into()))
        );
        assert_eq!(
            ids.resolve_link("https://matrix.to/#/@alice:example.org"),
            Some(MatrixLink::Puppet)
        );
        assert_eq!(ids.resolve_link("https://matrix.to/#/@bob:example.org"), None);
        assert_eq!(ids.resolve_link("https://example.org/@slack_acme_u1"), None);
        assert_eq!(ids.resolve_link("https://matrix.to/#/%4"), None);
    }
}
