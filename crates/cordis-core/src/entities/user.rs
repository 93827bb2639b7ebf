//! User entity - a vendor account seen anywhere in the event stream

use serde::{Deserialize, Serialize};

use super::{double_option, Entity, Patchable};
use crate::value_objects::Snowflake;

const CDN_BASE: &str = "https://cdn.discordapp.com";

/// User entity
///
/// Created on first sighting (READY, member lists, mention lists) and updated
/// in place afterwards; never removed while anything can still reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            global_name: None,
            avatar: None,
            bot: false,
        }
    }

    /// Display name: global name when set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// Get avatar URL or the default avatar URL
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("{CDN_BASE}/avatars/{}/{hash}.png", self.id),
            None => format!("{CDN_BASE}/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    /// Mention markup, e.g. `<@123>`
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    fn default_avatar_index(&self) -> u64 {
        (self.id.into_inner() >> 22) % 6
    }
}

impl Entity for User {
    fn id(&self) -> Snowflake {
        self.id
    }
}

/// Partial USER_UPDATE payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub global_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
    #[serde(default)]
    pub bot: Option<bool>,
}

impl Patchable for User {
    type Patch = UserPatch;

    fn apply(&mut self, patch: &UserPatch) {
        if let Some(username) = &patch.username {
            self.username.clone_from(username);
        }
        if let Some(global_name) = &patch.global_name {
            self.global_name.clone_from(global_name);
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar.clone_from(avatar);
        }
        if let Some(bot) = patch.bot {
            self.bot = bot;
        }
    }
}
