//! Resolution of user and channel references.

use std::collections::HashMap;

use tracing::debug;

use crate::common::error::LookupResult;
use crate::markup::escape::escape_markdown;
use crate::markup::tokens::{scrub_color_fragments, scrub_mention_tokens};
use crate::markup::{Markup, Node};
use crate::platform::{IdentityMap, PlatformLookup};

/// How one referenced entity appears in each body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    pub plain: String,
    /// Markdown, usually a matrix.to link.
    pub rich: String,
}

impl ResolvedEntity {
    /// Unresolvable ids are shown as written in both bodies.
    fn raw(id: &str) -> Self {
        Self {
            plain: id.to_string(),
            rich: id.to_string(),
        }
    }
}

/// Every entity a message refers to, keyed by Slack id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEntities {
    users: HashMap<String, ResolvedEntity>,
    channels: HashMap<String, ResolvedEntity>,
}

impl ResolvedEntities {
    pub fn user(&self, id: &str) -> Option<&ResolvedEntity> {
        self.users.get(id)
    }

    pub fn channel(&self, id: &str) -> Option<&ResolvedEntity> {
        self.channels.get(id)
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Looks up the entities in parsed markup.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    identity: IdentityMap,
}

impl EntityResolver {
    pub fn new(identity: IdentityMap) -> Self {
        Self { identity }
    }

    /// Resolve references left to right, one lookup at a time.
    ///
    /// Each distinct id is looked up once. A lookup that finds nothing yields
    /// the raw id; a lookup that fails aborts the whole resolution.
    pub async fn resolve(
        &self,
        markup: &Markup,
        lookup: &dyn PlatformLookup,
    ) -> LookupResult<ResolvedEntities> {
        let mut resolved = ResolvedEntities::default();

        for node in markup.entities() {
            match node {
                Node::Mention(entity) if !resolved.users.contains_key(&entity.id) => {
                    let value = self.resolve_user(&entity.id, lookup).await?;
                    resolved.users.insert(entity.id.clone(), value);
                }
                Node::Channel(entity) if !resolved.channels.contains_key(&entity.id) => {
                    let value = self.resolve_channel(&entity.id, lookup).await?;
                    resolved.channels.insert(entity.id.clone(), value);
                }
                _ => {}
            }
        }

        debug!(
            users = resolved.users.len(),
            channels = resolved.channels.len(),
            "Resolved entities"
        );
        Ok(resolved)
    }

    async fn resolve_user(
        &self,
        id: &str,
        lookup: &dyn PlatformLookup,
    ) -> LookupResult<ResolvedEntity> {
        if id == lookup.self_id() {
            let localpart = self.identity.puppet_localpart();
            return Ok(ResolvedEntity {
                plain: localpart.to_string(),
                rich: format!("[{}]({})", escape_markdown(localpart), self.identity.puppet_url()),
            });
        }

        Ok(match lookup.lookup_user(id).await? {
            Some(user) => {
                let name = display_name(&user.name, id);
                ResolvedEntity {
                    rich: format!("[{}]({})", escape_markdown(&name), self.identity.profile_url(id)),
                    plain: name,
                }
            }
            None => {
                debug!(user = %id, "Unknown user, keeping raw id");
                ResolvedEntity::raw(id)
            }
        })
    }

    async fn resolve_channel(
        &self,
        id: &str,
        lookup: &dyn PlatformLookup,
    ) -> LookupResult<ResolvedEntity> {
        Ok(match lookup.lookup_channel(id).await? {
            Some(channel) => {
                let name = format!("#{}", display_name(&channel.name, id));
                ResolvedEntity {
                    rich: format!("[{}]({})", escape_markdown(&name), self.identity.room_url(id)),
                    plain: name,
                }
            }
            None => {
                debug!(channel = %id, "Unknown channel, keeping raw id");
                ResolvedEntity::raw(id)
            }
        })
    }
}

/// Collaborator-supplied names are untrusted: no sentinels, no blank names.
fn display_name(name: &str, id: &str) -> String {
    let name = scrub_color_fragments(&scrub_mention_tokens(name));
    let name = name.trim();
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}
