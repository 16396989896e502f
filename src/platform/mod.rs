//! The Slack and Matrix collaborators the pipeline talks to.
//!
//! Session handling and API clients live outside this crate. The pipeline
//! only needs to look up Slack users, channels and bots, and to know how
//! Slack ids are named on the Matrix side.

pub mod directory;
pub mod identity;

use async_trait::async_trait;

use crate::common::error::LookupResult;
use crate::common::types::{BotProfile, ChannelInfo, UserProfile};

pub use directory::StaticDirectory;
pub use identity::{IdentityMap, MatrixLink, MATRIX_TO};

/// Read access to the Slack workspace.
///
/// Each lookup returns `Ok(None)` when the id is unknown. `Err` means the
/// collaborator could not answer at all.
#[async_trait]
pub trait PlatformLookup: Send + Sync {
    /// Slack user id of the puppeted account.
    fn self_id(&self) -> &str;

    async fn lookup_user(&self, id: &str) -> LookupResult<Option<UserProfile>>;

    async fn lookup_channel(&self, id: &str) -> LookupResult<Option<ChannelInfo>>;

    async fn lookup_bot(&self, id: &str) -> LookupResult<Option<BotProfile>>;
}
