//! Dispatch payload shapes
//!
//! Only the wrappers the domain entity types don't already cover. Entity
//! bodies (`Channel`, `Role`, `MessageData`, ...) deserialize directly.

use cordis_core::{Channel, MemberData, Role, Snowflake, User};
use serde::{Deserialize, Serialize};

/// READY
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    #[serde(default)]
    pub v: u8,
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
    pub session_id: String,
    /// Where to reconnect when resuming this session
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

/// Guild stub in READY and the body of GUILD_DELETE
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnavailableGuild {
    pub id: Snowflake,
    /// `true` for an outage; absent or `false` means the bot left the guild
    #[serde(default)]
    pub unavailable: bool,
}

/// Children that ride along with GUILD_CREATE
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildChildren {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub threads: Vec<Channel>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<MemberData>,
}

/// Events addressed to one guild
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GuildScope {
    pub guild_id: Snowflake,
}

/// GUILD_ROLE_CREATE / GUILD_ROLE_UPDATE
#[derive(Debug, Clone, Deserialize)]
pub struct RolePayload {
    pub guild_id: Snowflake,
    pub role: Role,
}

/// GUILD_ROLE_DELETE
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RoleDeletePayload {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
}

/// GUILD_MEMBER_UPDATE / GUILD_MEMBER_REMOVE
#[derive(Debug, Clone, Deserialize)]
pub struct MemberUserPayload {
    pub guild_id: Snowflake,
    pub user: User,
}

/// MESSAGE_DELETE
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MessageDeletePayload {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}
