//! Decoded dispatch events
//!
//! A dispatch body is decoded exactly once, here, into a closed union. The
//! reducer matches on it exhaustively and never touches raw JSON.

use cordis_core::{
    Channel, ChannelPatch, Guild, GuildPatch, InteractionData, MemberData, MemberPatch,
    MessageData, MessageUpdateData, Snowflake, User, UserPatch,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::payloads::{
    GuildChildren, GuildScope, MemberUserPayload, MessageDeletePayload, ReadyPayload,
    RoleDeletePayload, RolePayload, UnavailableGuild,
};
use super::GatewayEventType;

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Ready(ReadyPayload),
    Resumed,

    GuildCreate {
        guild: Guild,
        children: GuildChildren,
    },
    GuildUpdate {
        guild: Guild,
        patch: GuildPatch,
    },
    GuildDelete(UnavailableGuild),

    ChannelCreate(Channel),
    ChannelUpdate {
        channel: Channel,
        patch: ChannelPatch,
    },
    ChannelDelete(Channel),

    RoleCreate(RolePayload),
    RoleUpdate(RolePayload),
    RoleDelete(RoleDeletePayload),

    MemberAdd {
        guild_id: Snowflake,
        member: MemberData,
    },
    MemberUpdate {
        guild_id: Snowflake,
        user: User,
        patch: MemberPatch,
    },
    MemberRemove(MemberUserPayload),

    UserUpdate {
        user: User,
        patch: UserPatch,
    },

    MessageCreate(MessageData),
    /// Partial; embed unfurls carry no author or content
    MessageUpdate(MessageUpdateData),
    MessageDelete(MessageDeletePayload),

    InteractionCreate(InteractionData),

    /// An event type this client does not handle
    Unknown(String),
}

fn body<T: DeserializeOwned>(d: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(d)
}

impl DispatchEvent {
    /// Decode `d` according to the event name `t`
    pub fn decode(t: &str, d: &Value) -> Result<Self, serde_json::Error> {
        let Some(kind) = GatewayEventType::from_str(t) else {
            return Ok(Self::Unknown(t.to_string()));
        };

        Ok(match kind {
            GatewayEventType::Ready => Self::Ready(body(d)?),
            GatewayEventType::Resumed => Self::Resumed,

            GatewayEventType::GuildCreate => Self::GuildCreate {
                guild: body(d)?,
                children: body(d)?,
            },
            GatewayEventType::GuildUpdate => Self::GuildUpdate {
                guild: body(d)?,
                patch: body(d)?,
            },
            GatewayEventType::GuildDelete => Self::GuildDelete(body(d)?),

            GatewayEventType::ChannelCreate => Self::ChannelCreate(body(d)?),
            GatewayEventType::ChannelUpdate => Self::ChannelUpdate {
                channel: body(d)?,
                patch: body(d)?,
            },
            GatewayEventType::ChannelDelete => Self::ChannelDelete(body(d)?),

            GatewayEventType::GuildRoleCreate => Self::RoleCreate(body(d)?),
            GatewayEventType::GuildRoleUpdate => Self::RoleUpdate(body(d)?),
            GatewayEventType::GuildRoleDelete => Self::RoleDelete(body(d)?),

            GatewayEventType::GuildMemberAdd => Self::MemberAdd {
                guild_id: body::<GuildScope>(d)?.guild_id,
                member: body(d)?,
            },
            GatewayEventType::GuildMemberUpdate => {
                let MemberUserPayload { guild_id, user } = body(d)?;
                Self::MemberUpdate {
                    guild_id,
                    user,
                    patch: body(d)?,
                }
            }
            GatewayEventType::GuildMemberRemove => Self::MemberRemove(body(d)?),

            GatewayEventType::UserUpdate => Self::UserUpdate {
                user: body(d)?,
                patch: body(d)?,
            },

            GatewayEventType::MessageCreate => Self::MessageCreate(body(d)?),
            GatewayEventType::MessageUpdate => Self::MessageUpdate(body(d)?),
            GatewayEventType::MessageDelete => Self::MessageDelete(body(d)?),

            GatewayEventType::InteractionCreate => Self::InteractionCreate(body(d)?),
        })
    }

    /// Event name, for logs
    pub fn name(&self) -> &str {
        match self {
            Self::Ready(_) => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate { .. } => "GUILD_CREATE",
            Self::GuildUpdate { .. } => "GUILD_UPDATE",
            Self::GuildDelete(_) => "GUILD_DELETE",
            Self::ChannelCreate(_) => "CHANNEL_CREATE",
            Self::ChannelUpdate { .. } => "CHANNEL_UPDATE",
            Self::ChannelDelete(_) => "CHANNEL_DELETE",
            Self::RoleCreate(_) => "GUILD_ROLE_CREATE",
            Self::RoleUpdate(_) => "GUILD_ROLE_UPDATE",
            Self::RoleDelete(_) => "GUILD_ROLE_DELETE",
            Self::MemberAdd { .. } => "GUILD_MEMBER_ADD",
            Self::MemberUpdate { .. } => "GUILD_MEMBER_UPDATE",
            Self::MemberRemove(_) => "GUILD_MEMBER_REMOVE",
            Self::UserUpdate { .. } => "USER_UPDATE",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::MessageUpdate(_) => "MESSAGE_UPDATE",
            Self::MessageDelete(_) => "MESSAGE_DELETE",
            Self::InteractionCreate(_) => "INTERACTION_CREATE",
            Self::Unknown(name) => name,
        }
    }
}
