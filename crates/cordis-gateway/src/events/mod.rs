//! Gateway events
//!
//! Event names, wire payloads, and the decoded `DispatchEvent` union.

mod dispatch;
mod event_types;
mod payloads;

pub use dispatch::DispatchEvent;
pub use event_types::GatewayEventType;
pub use payloads::{
    GuildChildren, GuildScope, MemberUserPayload, MessageDeletePayload, ReadyPayload,
    RoleDeletePayload, RolePayload, UnavailableGuild,
};
