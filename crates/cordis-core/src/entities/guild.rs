//! Guild entity - a vendor server the current user belongs to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, Entity, Patchable};
use crate::value_objects::Snowflake;

/// Guild (server) entity
///
/// Channels are owned by the global channel cache; the guild only keeps their
/// ids. Members live in the per-guild member store keyed by this guild's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub member_count: u64,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub channel_ids: Vec<Snowflake>,
}

impl Guild {
    /// Create a new Guild
    pub fn new(id: Snowflake, name: impl Into<String>, owner_id: Snowflake) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            icon: None,
            member_count: 0,
            joined_at: None,
            channel_ids: Vec::new(),
        }
    }

    /// Check if a user is the guild owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// The @everyone role shares the guild's id
    #[inline]
    pub fn everyone_role_id(&self) -> Snowflake {
        self.id
    }

    /// Remember a channel id (no duplicates)
    pub fn add_channel_id(&mut self, channel_id: Snowflake) {
        if !self.channel_ids.contains(&channel_id) {
            self.channel_ids.push(channel_id);
        }
    }

    /// Forget a channel id; no-op if unknown
    pub fn remove_channel_id(&mut self, channel_id: Snowflake) {
        self.channel_ids.retain(|id| *id != channel_id);
    }
}

impl Entity for Guild {
    fn id(&self) -> Snowflake {
        self.id
    }
}

/// Partial GUILD_UPDATE payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(default)]
    pub member_count: Option<u64>,
}

impl Patchable for Guild {
    type Patch = GuildPatch;

    fn apply(&mut self, patch: &GuildPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(owner_id) = patch.owner_id {
            self.owner_id = owner_id;
        }
        if let Some(icon) = &patch.icon {
            self.icon.clone_from(icon);
        }
        if let Some(member_count) = patch.member_count {
            self.member_count = member_count;
        }
    }
}
