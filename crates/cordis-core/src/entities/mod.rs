//! Domain entities - the cached object graph plus transient value objects
//!
//! Cached kinds (`User`, `Guild`, `Channel`, `Role`, `Member`) implement
//! [`Entity`] so a single generic store can hold them. Kinds that receive
//! incremental updates also implement [`Patchable`] with an explicit per-field
//! merge, so fields absent from a partial payload are never touched.
//!
//! `Message` and `Interaction` are not cached: they are built fresh from each
//! payload and resolve related entities by id through an [`EntityContext`].

mod channel;
mod guild;
mod interaction;
mod member;
pub(crate) mod message;
mod role;
mod user;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::traits::{EntityLookup, RestGateway};
use crate::value_objects::Snowflake;

pub use channel::{Channel, ChannelPatch, ChannelType, OverwriteType, PermissionOverwrite};
pub use guild::{Guild, GuildPatch};
pub use interaction::{Interaction, InteractionData, InteractionType};
pub use member::{Member, MemberData, MemberPatch};
pub use message::{Message, MessageData, MessageReference, MessageUpdateData, MAX_CONTENT_LEN};
pub use role::Role;
pub use user::{User, UserPatch};

/// Base contract for every cached entity
pub trait Entity: Clone + Send + Sync + 'static {
    /// Immutable vendor id; the cache key
    fn id(&self) -> Snowflake;
}

/// Entity kinds that accept an in-place merge of a partial payload
pub trait Patchable: Entity {
    type Patch;

    /// Copy every field present in `patch` onto `self`
    fn apply(&mut self, patch: &Self::Patch);
}

/// Handles a transient value object needs to resolve references and issue requests
#[derive(Clone)]
pub struct EntityContext {
    pub lookup: Arc<dyn EntityLookup>,
    pub rest: Arc<dyn RestGateway>,
}

impl EntityContext {
    pub fn new(lookup: Arc<dyn EntityLookup>, rest: Arc<dyn RestGateway>) -> Self {
        Self { lookup, rest }
    }
}

impl fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityContext")
            .field("current_user_id", &self.lookup.current_user_id())
            .finish()
    }
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
