//! Read-only view over the entity cache

use crate::entities::{Channel, Guild, Member, Role, User};
use crate::value_objects::Snowflake;

/// Synchronous id lookups against the materialized state
///
/// A miss means "not known yet", never an error.
pub trait EntityLookup: Send + Sync {
    fn user(&self, id: Snowflake) -> Option<User>;

    fn guild(&self, id: Snowflake) -> Option<Guild>;

    fn channel(&self, id: Snowflake) -> Option<Channel>;

    /// Role ids are globally unique, so no guild id is needed
    fn role(&self, id: Snowflake) -> Option<Role>;

    fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member>;

    /// Id of the identity this session is logged in as, once READY has landed
    fn current_user_id(&self) -> Option<Snowflake>;
}
