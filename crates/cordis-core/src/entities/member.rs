//! Member entity - a user's membership in one guild

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, Entity, Patchable, User};
use crate::value_objects::Snowflake;

/// Guild member entity
///
/// `id` is the user's id. Role ids are weak references into the role cache;
/// ids that no longer resolve are skipped by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Create a new Member with no roles
    pub fn new(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            id: user_id,
            guild_id,
            nick: None,
            roles: Vec::new(),
            joined_at: None,
        }
    }

    /// Get display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nick.as_deref().unwrap_or(username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.roles.contains(&role_id)
    }

    /// Get number of roles
    #[inline]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

impl Entity for Member {
    fn id(&self) -> Snowflake {
        self.id
    }
}

/// Member object as embedded in gateway and REST payloads
///
/// The `user` field is absent when the member rides along with a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberData {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl MemberData {
    /// Build a cached member; `user_id` is used when `user` is missing
    pub fn into_member(self, guild_id: Snowflake, user_id: Option<Snowflake>) -> Option<Member> {
        let id = self.user.as_ref().map(|u| u.id).or(user_id)?;
        Some(Member {
            id,
            guild_id,
            nick: self.nick,
            roles: self.roles,
            joined_at: self.joined_at,
        })
    }
}

/// Partial GUILD_MEMBER_UPDATE payload
///
/// The role list is replaced wholesale when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub nick: Option<Option<String>>,
    #[serde(default)]
    pub roles: Option<Vec<Snowflake>>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Patchable for Member {
    type Patch = MemberPatch;

    fn apply(&mut self, patch: &MemberPatch) {
        if let Some(nick) = &patch.nick {
            self.nick.clone_from(nick);
        }
        if let Some(roles) = &patch.roles {
            self.roles.clone_from(roles);
        }
        if let Some(joined_at) = patch.joined_at {
            self.joined_at = Some(joined_at);
        }
    }
}
