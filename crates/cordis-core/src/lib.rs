//! # cordis-core
//!
//! Domain layer: cached entities, transient value objects, the permission
//! bitfield and its resolver, and the ports (`EntityLookup`, `RestGateway`)
//! the infrastructure crates implement. No networking lives here.

pub mod entities;
pub mod error;
pub mod resolver;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Channel, ChannelPatch, ChannelType, Entity, EntityContext, Guild, GuildPatch, Interaction,
    InteractionData, InteractionType, Member, MemberData, MemberPatch, Message, MessageData,
    MessageReference, MessageUpdateData, OverwriteType, Patchable, PermissionOverwrite, Role,
    User, UserPatch, MAX_CONTENT_LEN,
};
pub use error::DomainError;
pub use resolver::PermissionResolver;
pub use traits::{
    CreateMessage, EntityLookup, InteractionResponse, InteractionResponseData, RestGateway,
    RestResult,
};
pub use value_objects::{Permissions, Snowflake, SnowflakeParseError};
