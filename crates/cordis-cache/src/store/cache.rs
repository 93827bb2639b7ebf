//! The client-wide entity cache
//!
//! Groups one store per kind and keeps the cross-kind relationships
//! consistent: channel ids on guilds, and the guild cascade on delete.

use std::fmt;
use std::sync::Arc;

use cordis_core::{
    Channel, EntityLookup, Guild, Member, MemberPatch, Role, Snowflake, User,
};
use dashmap::DashMap;
use parking_lot::RwLock;

use super::EntityCache;

/// Everything removed by a guild cascade
#[derive(Debug, Default)]
pub struct RemovedGuild {
    pub guild: Option<Guild>,
    pub channels: Vec<Channel>,
    pub roles: Vec<Role>,
    pub members: usize,
}

/// Entry counts, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub users: usize,
    pub guilds: usize,
    pub channels: usize,
    pub roles: usize,
    pub members: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users={} guilds={} channels={} roles={} members={}",
            self.users, self.guilds, self.channels, self.roles, self.members
        )
    }
}

/// In-memory mirror of gateway state
///
/// Only the event reducer writes to it. Reads may come from any task.
pub struct Cache {
    users: EntityCache<User>,
    guilds: EntityCache<Guild>,
    channels: EntityCache<Channel>,
    roles: EntityCache<Role>,
    /// Members are scoped per guild
    members: DashMap<Snowflake, EntityCache<Member>>,
    current_user: RwLock<Option<Snowflake>>,
}

impl Cache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: EntityCache::new(),
            guilds: EntityCache::new(),
            channels: EntityCache::new(),
            roles: EntityCache::new(),
            members: DashMap::new(),
            current_user: RwLock::new(None),
        }
    }

    /// Create an empty cache wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn users(&self) -> &EntityCache<User> {
        &self.users
    }

    pub fn guilds(&self) -> &EntityCache<Guild> {
        &self.guilds
    }

    pub fn channels(&self) -> &EntityCache<Channel> {
        &self.channels
    }

    pub fn roles(&self) -> &EntityCache<Role> {
        &self.roles
    }

    // =========================================================================
    // Current identity
    // =========================================================================

    /// Record the logged-in identity (also cached as a regular user)
    pub fn set_current_user(&self, user: User) {
        *self.current_user.write() = Some(user.id);
        self.users.insert(user);
    }

    pub fn current_user(&self) -> Option<User> {
        let id = (*self.current_user.read())?;
        self.users.get(id)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Cache a user seen in a payload; returns the previous copy if any
    pub fn upsert_user(&self, user: User) -> Option<User> {
        self.users.insert(user)
    }

    // =========================================================================
    // Guilds
    // =========================================================================

    /// Insert a guild, preserving channel ids already known for it
    pub fn insert_guild(&self, mut guild: Guild) -> Option<Guild> {
        if let Some(existing) = self.guilds.get(guild.id) {
            for channel_id in existing.channel_ids {
                guild.add_channel_id(channel_id);
            }
        }
        self.guilds.insert(guild)
    }

    /// Remove a guild and cascade to its channels, roles, and members
    ///
    /// After this returns, no channel with `guild_id == id` remains cached.
    pub fn remove_guild(&self, id: Snowflake) -> RemovedGuild {
        let guild = self.guilds.remove(id);
        let channels = self.channels.retain(|c| c.guild_id != Some(id));
        let roles = self.roles.retain(|r| r.guild_id != id);
        let members = self
            .members
            .remove(&id)
            .map_or(0, |(_, store)| store.len());

        tracing::debug!(
            guild_id = %id,
            channels = channels.len(),
            roles = roles.len(),
            members,
            "Guild removed from cache"
        );

        RemovedGuild {
            guild,
            channels,
            roles,
            members,
        }
    }

    /// Drop a guild's channels and roles, keeping the guild and its members
    ///
    /// Applied before a full guild snapshot so entries the snapshot no longer
    /// lists do not linger. Returns the number of channels and roles dropped.
    pub fn prune_guild_children(&self, id: Snowflake) -> (usize, usize) {
        let channels = self.channels.retain(|c| c.guild_id != Some(id));
        let roles = self.roles.retain(|r| r.guild_id != id);
        self.guilds.update(id, |g| g.channel_ids.clear());
        (channels.len(), roles.len())
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Insert a channel and link it to its guild
    pub fn insert_channel(&self, channel: Channel) -> Option<Channel> {
        if let Some(guild_id) = channel.guild_id {
            let channel_id = channel.id;
            self.guilds
                .update(guild_id, |g| g.add_channel_id(channel_id));
        }
        self.channels.insert(channel)
    }

    /// Remove a channel and unlink it from its guild
    pub fn remove_channel(&self, id: Snowflake) -> Option<Channel> {
        let channel = self.channels.remove(id)?;
        if let Some(guild_id) = channel.guild_id {
            self.guilds.update(guild_id, |g| g.remove_channel_id(id));
        }
        Some(channel)
    }

    pub fn guild_channels(&self, guild_id: Snowflake) -> Vec<Channel> {
        self.channels.filter(|c| c.guild_id == Some(guild_id))
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub fn guild_roles(&self, guild_id: Snowflake) -> Vec<Role> {
        self.roles.filter(|r| r.guild_id == guild_id)
    }

    // =========================================================================
    // Members
    // =========================================================================

    pub fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.members.get(&guild_id)?.get(user_id)
    }

    pub fn insert_member(&self, member: Member) -> Option<Member> {
        self.members
            .entry(member.guild_id)
            .or_default()
            .insert(member)
    }

    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.members.get(&guild_id)?.remove(user_id)
    }

    /// Merge a partial member payload; `(before, after)` when the member was cached
    pub fn patch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        patch: &MemberPatch,
    ) -> Option<(Member, Member)> {
        self.members.get(&guild_id)?.patch(user_id, patch)
    }

    pub fn guild_members(&self, guild_id: Snowflake) -> Vec<Member> {
        self.members
            .get(&guild_id)
            .map(|store| store.all())
            .unwrap_or_default()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Drop everything; used before a fresh (non-resumed) session
    pub fn clear(&self) {
        self.users.clear();
        self.guilds.clear();
        self.channels.clear();
        self.roles.clear();
        self.members.clear();
        *self.current_user.write() = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            users: self.users.len(),
            guilds: self.guilds.len(),
            channels: self.channels.len(),
            roles: self.roles.len(),
            members: self.members.iter().map(|store| store.len()).sum(),
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("stats", &self.stats())
            .field("current_user", &*self.current_user.read())
            .finish()
    }
}

impl EntityLookup for Cache {
    fn user(&self, id: Snowflake) -> Option<User> {
        self.users.get(id)
    }

    fn guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.get(id)
    }

    fn channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.get(id)
    }

    fn role(&self, id: Snowflake) -> Option<Role> {
        self.roles.get(id)
    }

    fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        Cache::member(self, guild_id, user_id)
    }

    fn current_user_id(&self) -> Option<Snowflake> {
        *self.current_user.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordis_core::{Permissions, PermissionResolver};

    const GUILD: Snowflake = Snowflake::new(5);

    fn populated() -> Cache {
        let cache = Cache::new();
        cache.insert_guild(Guild::new(GUILD, "g", Snowflake::new(1)));
        cache.insert_channel(Channel::new_text(Snowflake::new(10), GUILD, "a"));
        cache.insert_channel(Channel::new_text(Snowflake::new(11), GUILD, "b"));
        cache.insert_channel(Channel::new_text(Snowflake::new(20), Snowflake::new(6), "other"));
        cache.roles().insert(Role::everyone(GUILD, Permissions::VIEW_CHANNEL));
        cache.insert_member(Member::new(GUILD, Snowflake::new(2)));
        cache
    }

    #[test]
    fn test_insert_channel_links_guild() {
        let cache = populated();
        let guild = cache.guilds().get(GUILD).unwrap();
        assert_eq!(guild.channel_ids, vec![Snowflake::new(10), Snowflake::new(11)]);
        assert_eq!(cache.guild_channels(GUILD).len(), 2);
    }

    #[test]
    fn test_remove_guild_cascades() {
        let cache = populated();
        let removed = cache.remove_guild(GUILD);

        assert!(removed.guild.is_some());
        assert_eq!(removed.channels.len(), 2);
        assert_eq!(removed.roles.len(), 1);
        assert_eq!(removed.members, 1);

        assert!(cache.channels().get(Snowflake::new(10)).is_none());
        assert!(cache.channels().get(Snowflake::new(11)).is_none());
        assert!(cache.channels().get(Snowflake::new(20)).is_some());
        assert!(cache.member(GUILD, Snowflake::new(2)).is_none());
    }

    #[test]
    fn test_remove_unknown_guild_is_noop() {
        let cache = populated();
        let removed = cache.remove_guild(Snowflake::new(999));
        assert!(removed.guild.is_none());
        assert_eq!(cache.stats().channels, 3);
    }

    #[test]
    fn test_remove_channel_unlinks_guild() {
        let cache = populated();
        cache.remove_channel(Snowflake::new(10));
        let guild = cache.guilds().get(GUILD).unwrap();
        assert_eq!(guild.channel_ids, vec![Snowflake::new(11)]);
    }

    #[test]
    fn test_reinserting_guild_keeps_channel_links() {
        let cache = populated();
        cache.insert_guild(Guild::new(GUILD, "renamed", Snowflake::new(1)));
        let guild = cache.guilds().get(GUILD).unwrap();
        assert_eq!(guild.name, "renamed");
        assert_eq!(guild.channel_ids.len(), 2);
    }

    #[test]
    fn test_prune_guild_children_keeps_guild_and_members() {
        let cache = populated();
        assert_eq!(cache.prune_guild_children(GUILD), (2, 1));

        assert!(cache.guilds().get(GUILD).unwrap().channel_ids.is_empty());
        assert!(cache.guild_channels(GUILD).is_empty());
        assert!(cache.guild_roles(GUILD).is_empty());
        assert!(cache.member(GUILD, Snowflake::new(2)).is_some());
        assert!(cache.channels().get(Snowflake::new(20)).is_some());
    }

    #[test]
    fn test_current_user() {
        let cache = Cache::new();
        assert!(cache.current_user().is_none());
        cache.set_current_user(User::new(Snowflake::new(1), "me"));
        assert_eq!(cache.current_user().unwrap().username, "me");
        assert_eq!(cache.current_user_id(), Some(Snowflake::new(1)));
    }

    #[test]
    fn test_clear() {
        let cache = populated();
        cache.set_current_user(User::new(Snowflake::new(1), "me"));
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.current_user_id().is_none());
    }

    #[test]
    fn test_resolver_over_cache() {
        let cache = populated();
        let resolver = PermissionResolver::new(&cache);
        assert!(resolver.has_permission(GUILD, Snowflake::new(2), Permissions::VIEW_CHANNEL));
        assert!(!resolver.has_permission(GUILD, Snowflake::new(2), Permissions::SEND_MESSAGES));
        assert_eq!(resolver.member_permissions(GUILD, Snowflake::new(1)), Permissions::all());
    }
}
