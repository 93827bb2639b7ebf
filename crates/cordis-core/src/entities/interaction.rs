//! Interaction value object - slash commands, components, modals

use std::fmt;

use serde::{Deserialize, Serialize};

use super::message::validate_content;
use super::{Channel, EntityContext, Guild, Member, MemberData, User};
use crate::traits::{InteractionResponse, RestResult};
use crate::value_objects::Snowflake;

/// Interaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::Autocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> Self {
        match kind {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::Autocomplete => 4,
            InteractionType::ModalSubmit => 5,
            InteractionType::Unknown(other) => other,
        }
    }
}

/// INTERACTION_CREATE payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
    pub id: Snowflake,
    pub application_id: Snowflake,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub member: Option<MemberData>,
    #[serde(default)]
    pub user: Option<User>,
    pub token: String,
}

impl InteractionData {
    /// The invoking user: `member.user` in guilds, `user` in DMs
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

/// Interaction value object
///
/// Like [`super::Message`], related entities are resolved through the cache
/// on access.
#[derive(Clone)]
pub struct Interaction {
    pub id: Snowflake,
    pub application_id: Snowflake,
    pub kind: InteractionType,
    pub data: Option<serde_json::Value>,
    pub guild_id: Option<Snowflake>,
    pub channel_id: Option<Snowflake>,
    pub user_id: Option<Snowflake>,
    token: String,
    ctx: EntityContext,
}

impl Interaction {
    pub fn new(payload: InteractionData, ctx: EntityContext) -> Self {
        let user_id = payload.invoker().map(|u| u.id);
        Self {
            id: payload.id,
            application_id: payload.application_id,
            kind: payload.kind,
            data: payload.data,
            guild_id: payload.guild_id,
            channel_id: payload.channel_id,
            user_id,
            token: payload.token,
            ctx,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user_id.and_then(|id| self.ctx.lookup.user(id))
    }

    pub fn member(&self) -> Option<Member> {
        let (guild_id, user_id) = (self.guild_id?, self.user_id?);
        self.ctx.lookup.member(guild_id, user_id)
    }

    pub fn channel(&self) -> Option<Channel> {
        self.channel_id.and_then(|id| self.ctx.lookup.channel(id))
    }

    pub fn guild(&self) -> Option<Guild> {
        self.guild_id.and_then(|id| self.ctx.lookup.guild(id))
    }

    #[inline]
    pub fn is_command(&self) -> bool {
        self.kind == InteractionType::ApplicationCommand
    }

    /// Invoked command name, for application commands
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref()?.get("name")?.as_str()
    }

    /// Respond with a message
    pub async fn reply(&self, content: impl Into<String>, ephemeral: bool) -> RestResult<()> {
        let content = content.into();
        validate_content(&content)?;

        let response = InteractionResponse::message(content, ephemeral);
        self.ctx
            .rest
            .create_interaction_response(self.id, &self.token, &response)
            .await
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
