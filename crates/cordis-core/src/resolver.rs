//! Permission resolution for guild members
//!
//! Effective guild permissions are the union of the @everyone role and every
//! role the member holds, with two hard overrides: the guild owner gets every
//! permission, and ADMINISTRATOR expands to every permission. Channel
//! permissions then apply the channel's overwrites on top.

use tracing::debug;

use crate::entities::{Channel, Guild, Member, OverwriteType, Role};
use crate::error::DomainError;
use crate::traits::EntityLookup;
use crate::value_objects::{Permissions, Snowflake};

/// Computes permission sets from cached guild state
pub struct PermissionResolver<'a> {
    lookup: &'a dyn EntityLookup,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(lookup: &'a dyn EntityLookup) -> Self {
        Self { lookup }
    }

    /// Resolve a raw bitfield (ADMINISTRATOR expands to everything)
    #[inline]
    pub fn resolve(bits: Permissions) -> Permissions {
        bits.resolve()
    }

    /// Check a role for a permission by vendor name
    pub fn role_has(role: &Role, name: &str) -> bool {
        role.permissions.has_named(name)
    }

    /// Effective permissions of a user across a whole guild
    ///
    /// An uncached guild yields no permissions. An uncached member is treated
    /// as holding only @everyone. Role ids that no longer resolve are skipped.
    pub fn member_permissions(&self, guild_id: Snowflake, user_id: Snowflake) -> Permissions {
        let Some(guild) = self.lookup.guild(guild_id) else {
            return Permissions::empty();
        };
        let member = self.lookup.member(guild_id, user_id);
        self.base_permissions(&guild, user_id, member.as_ref()).resolve()
    }

    /// Effective permissions of a user inside a specific channel
    pub fn channel_permissions(&self, channel: &Channel, user_id: Snowflake) -> Permissions {
        let Some(guild_id) = channel.guild_id else {
            // DM channels carry no guild-based permissions
            return Permissions::DEFAULT;
        };
        let Some(guild) = self.lookup.guild(guild_id) else {
            return Permissions::empty();
        };

        let member = self.lookup.member(guild_id, user_id);
        let base = self.base_permissions(&guild, user_id, member.as_ref());
        if base.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }

        let mut permissions = base;

        if let Some(everyone) = channel.overwrite_for(guild.everyone_role_id()) {
            permissions.remove(everyone.deny);
            permissions.insert(everyone.allow);
        }

        if let Some(member) = &member {
            let (allow, deny) = channel
                .permission_overwrites
                .iter()
                .filter(|o| o.kind == OverwriteType::Role && member.has_role(o.id))
                .fold((Permissions::empty(), Permissions::empty()), |(a, d), o| {
                    (a | o.allow, d | o.deny)
                });
            permissions.remove(deny);
            permissions.insert(allow);
        }

        if let Some(own) = channel
            .permission_overwrites
            .iter()
            .find(|o| o.kind == OverwriteType::Member && o.id == user_id)
        {
            permissions.remove(own.deny);
            permissions.insert(own.allow);
        }

        debug!(
            user_id = %user_id,
            channel_id = %channel.id,
            permissions = %permissions,
            "Computed channel permissions"
        );

        permissions
    }

    /// Check if a user holds a permission in a guild
    pub fn has_permission(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        permission: Permissions,
    ) -> bool {
        self.member_permissions(guild_id, user_id).contains(permission)
    }

    /// Check permission and return error if denied
    pub fn require_permission(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        permission: Permissions,
    ) -> Result<(), DomainError> {
        let granted = self.member_permissions(guild_id, user_id);
        if granted.contains(permission) {
            return Ok(());
        }
        let missing = (permission - granted).list().join(", ");
        Err(DomainError::MissingPermission(missing))
    }

    /// Raw union before the ADMINISTRATOR expansion; owner short-circuits to all
    fn base_permissions(
        &self,
        guild: &Guild,
        user_id: Snowflake,
        member: Option<&Member>,
    ) -> Permissions {
        if guild.is_owner(user_id) {
            debug!(user_id = %user_id, guild_id = %guild.id, "User is guild owner, granting all permissions");
            return Permissions::all();
        }

        let mut permissions = self
            .lookup
            .role(guild.everyone_role_id())
            .map(|role| role.permissions)
            .unwrap_or_default();

        if let Some(member) = member {
            permissions |= Permissions::combine(
                member
                    .roles
                    .iter()
                    .filter_map(|id| self.lookup.role(*id))
                    .map(|role| role.permissions),
            );
        }

        debug!(
            user_id = %user_id,
            guild_id = %guild.id,
            permissions = %permissions,
            "Computed member permissions"
        );

        permissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::message::tests::StubLookup;
    use crate::entities::PermissionOverwrite;

    const GUILD: Snowflake = Snowflake::new(5);
    const OWNER: Snowflake = Snowflake::new(1);
    const ALICE: Snowflake = Snowflake::new(2);

    fn guild_with_roles(roles: &[Role], alice_roles: &[u64]) -> StubLookup {
        let mut lookup = StubLookup::default();
        lookup.guilds.insert(GUILD, Guild::new(GUILD, "g", OWNER));
        for role in roles {
            lookup.roles.insert(role.id, role.clone());
        }
        let mut alice = Member::new(GUILD, ALICE);
        alice.roles = alice_roles.iter().map(|id| Snowflake::new(*id)).collect();
        lookup.members.insert((GUILD, ALICE), alice);
        lookup
    }

    #[test]
    fn test_role_has_admin_override() {
        let role: Role =
            serde_json::from_str(r#"{"id":"9","guild_id":"5","permissions":"8"}"#).unwrap();
        assert!(PermissionResolver::role_has(&role, "MANAGE_CHANNELS"));
        assert!(PermissionResolver::role_has(&role, "MODERATE_MEMBERS"));
    }

    #[test]
    fn test_owner_gets_everything() {
        let lookup = guild_with_roles(&[], &[]);
        let resolver = PermissionResolver::new(&lookup);
        assert_eq!(resolver.member_permissions(GUILD, OWNER), Permissions::all());
    }

    #[test]
    fn test_union_of_everyone_and_roles() {
        let lookup = guild_with_roles(
            &[
                Role::everyone(GUILD, Permissions::VIEW_CHANNEL),
                Role::new(Snowflake::new(20), GUILD, "mod", Permissions::KICK_MEMBERS),
            ],
            &[20, 404],
        );
        let resolver = PermissionResolver::new(&lookup);

        let perms = resolver.member_permissions(GUILD, ALICE);
        assert_eq!(perms, Permissions::VIEW_CHANNEL | Permissions::KICK_MEMBERS);
        assert!(resolver.has_permission(GUILD, ALICE, Permissions::KICK_MEMBERS));
        assert!(!resolver.has_permission(GUILD, ALICE, Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_adding_a_role_never_removes() {
        let roles = [
            Role::everyone(GUILD, Permissions::VIEW_CHANNEL),
            Role::new(Snowflake::new(20), GUILD, "a", Permissions::SEND_MESSAGES),
            Role::new(Snowflake::new(21), GUILD, "b", Permissions::MANAGE_MESSAGES),
        ];
        let before = PermissionResolver::new(&guild_with_roles(&roles, &[20]))
            .member_permissions(GUILD, ALICE);
        let after = PermissionResolver::new(&guild_with_roles(&roles, &[20, 21]))
            .member_permissions(GUILD, ALICE);
        assert!(after.contains(before));
    }

    #[test]
    fn test_admin_role_grants_all() {
        let lookup = guild_with_roles(
            &[Role::new(Snowflake::new(20), GUILD, "admin", Permissions::ADMINISTRATOR)],
            &[20],
        );
        let resolver = PermissionResolver::new(&lookup);
        assert_eq!(resolver.member_permissions(GUILD, ALICE), Permissions::all());
    }

    #[test]
    fn test_unknown_guild_yields_nothing() {
        let lookup = StubLookup::default();
        let resolver = PermissionResolver::new(&lookup);
        assert!(resolver.member_permissions(GUILD, ALICE).is_empty());
    }

    #[test]
    fn test_require_permission_reports_missing() {
        let lookup = guild_with_roles(&[Role::everyone(GUILD, Permissions::VIEW_CHANNEL)], &[]);
        let resolver = PermissionResolver::new(&lookup);

        assert!(resolver
            .require_permission(GUILD, ALICE, Permissions::VIEW_CHANNEL)
            .is_ok());
        let err = resolver
            .require_permission(GUILD, ALICE, Permissions::VIEW_CHANNEL | Permissions::BAN_MEMBERS)
            .unwrap_err();
        assert!(matches!(err, DomainError::MissingPermission(ref p) if p == "BAN_MEMBERS"));
    }

    #[test]
    fn test_channel_overwrites_apply_in_order() {
        let lookup = guild_with_roles(
            &[
                Role::everyone(GUILD, Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES),
                Role::new(Snowflake::new(20), GUILD, "muted", Permissions::empty()),
            ],
            &[20],
        );
        let resolver = PermissionResolver::new(&lookup);

        let mut channel = Channel::new_text(Snowflake::new(10), GUILD, "general");
        channel.permission_overwrites = vec![
            PermissionOverwrite {
                id: GUILD,
                kind: OverwriteType::Role,
                allow: Permissions::ADD_REACTIONS,
                deny: Permissions::empty(),
            },
            PermissionOverwrite {
                id: Snowflake::new(20),
                kind: OverwriteType::Role,
                allow: Permissions::empty(),
                deny: Permissions::SEND_MESSAGES | Permissions::ADD_REACTIONS,
            },
            PermissionOverwrite {
                id: ALICE,
                kind: OverwriteType::Member,
                allow: Permissions::ADD_REACTIONS,
                deny: Permissions::empty(),
            },
        ];

        let perms = resolver.channel_permissions(&channel, ALICE);
        assert!(perms.contains(Permissions::VIEW_CHANNEL));
        assert!(!perms.contains(Permissions::SEND_MESSAGES));
        assert!(perms.contains(Permissions::ADD_REACTIONS));
    }

    #[test]
    fn test_admin_ignores_channel_denies() {
        let lookup = guild_with_roles(&[Role::everyone(GUILD, Permissions::ADMINISTRATOR)], &[]);
        let resolver = PermissionResolver::new(&lookup);

        let mut channel = Channel::new_text(Snowflake::new(10), GUILD, "locked");
        channel.permission_overwrites.push(PermissionOverwrite {
            id: GUILD,
            kind: OverwriteType::Role,
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
        });
        assert_eq!(resolver.channel_permissions(&channel, ALICE), Permissions::all());
    }
}
