//! Role entity - a guild role carrying a permission bitfield

use serde::{Deserialize, Serialize};

use super::Entity;
use crate::value_objects::{Permissions, Snowflake};

/// Role entity
///
/// Always replaced wholesale on update. The wire role object carries no guild
/// id, so the reducer stamps `guild_id` from the enclosing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub flags: u64,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    /// Create a new Role
    pub fn new(
        id: Snowflake,
        guild_id: Snowflake,
        name: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        Self {
            id,
            guild_id,
            name: name.into(),
            permissions,
            position: 0,
            flags: 0,
            color: 0,
            hoist: false,
            managed: false,
            mentionable: false,
        }
    }

    /// Create the @everyone role for a guild (same id as the guild)
    pub fn everyone(guild_id: Snowflake, permissions: Permissions) -> Self {
        Self::new(guild_id, guild_id, "@everyone", permissions)
    }

    /// Check if this is the guild's @everyone role
    #[inline]
    pub fn is_everyone(&self) -> bool {
        self.id == self.guild_id
    }

    /// Effective permission set (ADMINISTRATOR expands to everything)
    #[inline]
    pub fn resolved_permissions(&self) -> Permissions {
        self.permissions.resolve()
    }

    /// Check if this role grants a specific permission
    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }

    /// Compare role positions for hierarchy (higher position = more authority)
    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        (self.position, other.id) > (other.position, self.id)
    }

    /// Mention markup, e.g. `<@&123>`
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }

    /// Get the color as a hex string (without #)
    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }
}

impl Entity for Role {
    fn id(&self) -> Snowflake {
        self.id
    }
}
