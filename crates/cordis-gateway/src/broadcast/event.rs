//! Events handed to listeners
//!
//! Produced by the reducer after the cache has been updated. Update variants
//! carry the cached copy from before the change when there was one.

use std::fmt;

use cordis_core::{Channel, Guild, Interaction, Member, Message, Role, Snowflake, User};

/// Listener key; one per `Event` variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Resumed,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    MemberAdd,
    MemberUpdate,
    MemberRemove,
    UserUpdate,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    InteractionCreate,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Resumed => "resumed",
            Self::GuildCreate => "guildCreate",
            Self::GuildUpdate => "guildUpdate",
            Self::GuildDelete => "guildDelete",
            Self::ChannelCreate => "channelCreate",
            Self::ChannelUpdate => "channelUpdate",
            Self::ChannelDelete => "channelDelete",
            Self::RoleCreate => "roleCreate",
            Self::RoleUpdate => "roleUpdate",
            Self::RoleDelete => "roleDelete",
            Self::MemberAdd => "guildMemberAdd",
            Self::MemberUpdate => "guildMemberUpdate",
            Self::MemberRemove => "guildMemberRemove",
            Self::UserUpdate => "userUpdate",
            Self::MessageCreate => "messageCreate",
            Self::MessageUpdate => "messageUpdate",
            Self::MessageDelete => "messageDelete",
            Self::InteractionCreate => "interactionCreate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// Session is ready; the cache holds the initial state
    Ready { user: User },
    Resumed,

    GuildCreate(Guild),
    GuildUpdate {
        old: Option<Guild>,
        new: Guild,
    },
    /// `guild` is the cached copy, if it was cached
    GuildDelete {
        id: Snowflake,
        guild: Option<Guild>,
        unavailable: bool,
    },

    ChannelCreate(Channel),
    ChannelUpdate {
        old: Option<Channel>,
        new: Channel,
    },
    ChannelDelete(Channel),

    RoleCreate(Role),
    RoleUpdate {
        old: Option<Role>,
        new: Role,
    },
    RoleDelete {
        guild_id: Snowflake,
        role_id: Snowflake,
        role: Option<Role>,
    },

    MemberAdd(Member),
    MemberUpdate {
        old: Option<Member>,
        new: Member,
    },
    MemberRemove {
        guild_id: Snowflake,
        user: User,
        member: Option<Member>,
    },

    UserUpdate {
        old: Option<User>,
        new: User,
    },

    MessageCreate(Message),
    MessageUpdate(Message),
    MessageDelete {
        id: Snowflake,
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
    },

    InteractionCreate(Interaction),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Ready { .. } => EventKind::Ready,
            Self::Resumed => EventKind::Resumed,
            Self::GuildCreate(_) => EventKind::GuildCreate,
            Self::GuildUpdate { .. } => EventKind::GuildUpdate,
            Self::GuildDelete { .. } => EventKind::GuildDelete,
            Self::ChannelCreate(_) => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete(_) => EventKind::ChannelDelete,
            Self::RoleCreate(_) => EventKind::RoleCreate,
            Self::RoleUpdate { .. } => EventKind::RoleUpdate,
            Self::RoleDelete { .. } => EventKind::RoleDelete,
            Self::MemberAdd(_) => EventKind::MemberAdd,
            Self::MemberUpdate { .. } => EventKind::MemberUpdate,
            Self::MemberRemove { .. } => EventKind::MemberRemove,
            Self::UserUpdate { .. } => EventKind::UserUpdate,
            Self::MessageCreate(_) => EventKind::MessageCreate,
            Self::MessageUpdate(_) => EventKind::MessageUpdate,
            Self::MessageDelete { .. } => EventKind::MessageDelete,
            Self::InteractionCreate(_) => EventKind::InteractionCreate,
        }
    }
}
