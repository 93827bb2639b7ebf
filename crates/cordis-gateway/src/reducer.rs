//! Event reducer
//!
//! Applies decoded dispatch events to the cache and turns each into the
//! `Event` listeners receive. This is the only code that writes to the
//! cache, and the supervisor calls it from a single task, one frame at a time.

use std::sync::Arc;

use cordis_cache::Cache;
use cordis_core::{
    EntityContext, EntityLookup, Interaction, InteractionData, Member, MemberData, Message,
    MessageData, MessageUpdateData, Patchable, RestGateway, Snowflake, User,
};
use tracing::{debug, warn};

use crate::broadcast::Event;
use crate::events::DispatchEvent;

pub struct EventReducer {
    cache: Arc<Cache>,
    ctx: EntityContext,
}

impl EventReducer {
    pub fn new(cache: Arc<Cache>, rest: Arc<dyn RestGateway>) -> Self {
        let lookup: Arc<dyn EntityLookup> = Arc::clone(&cache) as Arc<dyn EntityLookup>;
        Self {
            cache,
            ctx: EntityContext::new(lookup, rest),
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Context handed to every `Message` and `Interaction` built here
    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    /// Apply one event; returns what listeners should see, if anything
    pub async fn apply(&self, event: DispatchEvent) -> Option<Event> {
        let cache = &self.cache;

        match event {
            DispatchEvent::Ready(ready) => {
                cache.set_current_user(ready.user.clone());
                debug!(
                    user_id = %ready.user.id,
                    guilds = ready.guilds.len(),
                    "Applied READY"
                );
                Some(Event::Ready { user: ready.user })
            }

            DispatchEvent::Resumed => Some(Event::Resumed),

            // =================================================================
            // Guilds
            // =================================================================
            DispatchEvent::GuildCreate { guild, children } => {
                let guild_id = guild.id;
                // A repeated GUILD_CREATE is a full snapshot of channels and roles
                let (channels, roles) = cache.prune_guild_children(guild_id);
                if channels + roles > 0 {
                    debug!(guild_id = %guild_id, channels, roles, "Replacing guild snapshot");
                }
                cache.insert_guild(guild);

                for mut channel in children.channels.into_iter().chain(children.threads) {
                    channel.guild_id.get_or_insert(guild_id);
                    cache.insert_channel(channel);
                }
                for mut role in children.roles {
                    role.guild_id = guild_id;
                    cache.roles().insert(role);
                }
                for data in children.members {
                    self.insert_member(guild_id, data, None);
                }

                cache.guilds().get(guild_id).map(Event::GuildCreate)
            }

            DispatchEvent::GuildUpdate { guild, patch } => {
                match cache.guilds().patch(guild.id, &patch) {
                    Some((old, new)) => Some(Event::GuildUpdate {
                        old: Some(old),
                        new,
                    }),
                    None => {
                        cache.insert_guild(guild.clone());
                        Some(Event::GuildUpdate {
                            old: None,
                            new: guild,
                        })
                    }
                }
            }

            DispatchEvent::GuildDelete(stub) => {
                let removed = cache.remove_guild(stub.id);
                Some(Event::GuildDelete {
                    id: stub.id,
                    guild: removed.guild,
                    unavailable: stub.unavailable,
                })
            }

            // =================================================================
            // Channels
            // =================================================================
            DispatchEvent::ChannelCreate(channel) => {
                cache.insert_channel(channel.clone());
                Some(Event::ChannelCreate(channel))
            }

            DispatchEvent::ChannelUpdate { channel, patch } => {
                match cache.channels().patch(channel.id, &patch) {
                    Some((old, new)) => Some(Event::ChannelUpdate {
                        old: Some(old),
                        new,
                    }),
                    None => {
                        cache.insert_channel(channel.clone());
                        Some(Event::ChannelUpdate {
                            old: None,
                            new: channel,
                        })
                    }
                }
            }

            DispatchEvent::ChannelDelete(channel) => {
                let removed = cache.remove_channel(channel.id).unwrap_or(channel);
                Some(Event::ChannelDelete(removed))
            }

            // =================================================================
            // Roles (replaced wholesale)
            // =================================================================
            DispatchEvent::RoleCreate(payload) => {
                let mut role = payload.role;
                role.guild_id = payload.guild_id;
                cache.roles().insert(role.clone());
                Some(Event::RoleCreate(role))
            }

            DispatchEvent::RoleUpdate(payload) => {
                let mut role = payload.role;
                role.guild_id = payload.guild_id;
                let old = cache.roles().insert(role.clone());
                Some(Event::RoleUpdate { old, new: role })
            }

            DispatchEvent::RoleDelete(payload) => Some(Event::RoleDelete {
                guild_id: payload.guild_id,
                role_id: payload.role_id,
                role: cache.roles().remove(payload.role_id),
            }),

            // =================================================================
            // Members
            // =================================================================
            DispatchEvent::MemberAdd { guild_id, member } => {
                let member = self.insert_member(guild_id, member, None)?;
                cache
                    .guilds()
                    .update(guild_id, |g| g.member_count = g.member_count.saturating_add(1));
                Some(Event::MemberAdd(member))
            }

            DispatchEvent::MemberUpdate {
                guild_id,
                user,
                patch,
            } => {
                let user_id = user.id;
                cache.upsert_user(user);

                match cache.patch_member(guild_id, user_id, &patch) {
                    Some((old, new)) => Some(Event::MemberUpdate {
                        old: Some(old),
                        new,
                    }),
                    None => {
                        let mut member = Member::new(guild_id, user_id);
                        member.apply(&patch);
                        cache.insert_member(member.clone());
                        Some(Event::MemberUpdate {
                            old: None,
                            new: member,
                        })
                    }
                }
            }

            DispatchEvent::MemberRemove(payload) => {
                let member = cache.remove_member(payload.guild_id, payload.user.id);
                cache.guilds().update(payload.guild_id, |g| {
                    g.member_count = g.member_count.saturating_sub(1);
                });
                Some(Event::MemberRemove {
                    guild_id: payload.guild_id,
                    user: payload.user,
                    member,
                })
            }

            // =================================================================
            // Users
            // =================================================================
            DispatchEvent::UserUpdate { user, patch } => {
                match cache.users().patch(user.id, &patch) {
                    Some((old, new)) => Some(Event::UserUpdate {
                        old: Some(old),
                        new,
                    }),
                    None => {
                        cache.upsert_user(user.clone());
                        Some(Event::UserUpdate {
                            old: None,
                            new: user,
                        })
                    }
                }
            }

            // =================================================================
            // Transient value objects
            // =================================================================
            DispatchEvent::MessageCreate(data) => {
                let message = self.message(data).await;
                Some(Event::MessageCreate(message))
            }

            DispatchEvent::MessageUpdate(data) => {
                let message = self.message_update(data).await;
                Some(Event::MessageUpdate(message))
            }

            DispatchEvent::MessageDelete(payload) => Some(Event::MessageDelete {
                id: payload.id,
                channel_id: payload.channel_id,
                guild_id: payload.guild_id,
            }),

            DispatchEvent::InteractionCreate(data) => {
                let interaction = self.interaction(data).await;
                Some(Event::InteractionCreate(interaction))
            }

            DispatchEvent::Unknown(name) => {
                debug!(event = %name, "Ignoring unhandled dispatch event");
                None
            }
        }
    }

    /// Cache a member and its user; `fallback_user` covers payloads without `user`
    fn insert_member(
        &self,
        guild_id: Snowflake,
        data: MemberData,
        fallback_user: Option<Snowflake>,
    ) -> Option<Member> {
        if let Some(user) = data.user.clone() {
            self.cache.upsert_user(user);
        }
        let member = data.into_member(guild_id, fallback_user)?;
        self.cache.insert_member(member.clone());
        Some(member)
    }

    fn record_users<'a>(&self, users: impl IntoIterator<Item = &'a User>) {
        for user in users {
            self.cache.upsert_user(user.clone());
        }
    }

    async fn message(&self, mut data: MessageData) -> Message {
        self.record_users(std::iter::once(&data.author).chain(&data.mentions));

        if let (Some(guild_id), Some(member)) = (data.guild_id, data.member.take()) {
            self.insert_member(guild_id, member, Some(data.author.id));
        }

        self.ensure_channel(data.channel_id).await;
        Message::new(data, self.ctx.clone())
    }

    async fn message_update(&self, mut data: MessageUpdateData) -> Message {
        self.record_users(data.author.iter().chain(data.mentions.iter().flatten()));

        if let (Some(guild_id), Some(member)) = (data.guild_id, data.member.take()) {
            self.insert_member(guild_id, member, data.author.as_ref().map(|u| u.id));
        }

        self.ensure_channel(data.channel_id).await;
        Message::from_update(data, self.ctx.clone())
    }

    async fn interaction(&self, data: InteractionData) -> Interaction {
        self.record_users(data.invoker());

        if let (Some(guild_id), Some(member)) = (data.guild_id, data.member.clone()) {
            self.insert_member(guild_id, member, None);
        }
        if let Some(channel_id) = data.channel_id {
            self.ensure_channel(channel_id).await;
        }

        Interaction::new(data, self.ctx.clone())
    }

    /// Fetch and cache a channel the gateway has not told us about
    ///
    /// A failed fetch leaves the channel absent; the event is still delivered.
    async fn ensure_channel(&self, channel_id: Snowflake) {
        if self.cache.channels().contains(channel_id) {
            return;
        }

        match self.ctx.rest.get_channel(channel_id).await {
            Ok(channel) => {
                debug!(channel_id = %channel_id, "Backfilled uncached channel");
                self.cache.insert_channel(channel);
            }
            Err(e) if e.is_not_found() => {
                debug!(channel_id = %channel_id, "Channel unknown to the API");
            }
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Channel backfill failed");
            }
        }
    }
}

impl std::fmt::Debug for EventReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReducer")
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use cordis_core::{
        Channel, CreateMessage, DomainError, InteractionResponse, Permissions, PermissionResolver,
        RestResult,
    };
    use parking_lot::Mutex;
    use serde_json::json;

    /// Serves `get_channel` from a fixed list and records every call
    #[derive(Default)]
    pub(crate) struct FakeRest {
        pub channels: Vec<Channel>,
        pub fetched: Mutex<Vec<Snowflake>>,
    }

    #[async_trait]
    impl RestGateway for FakeRest {
        async fn get_channel(&self, channel_id: Snowflake) -> RestResult<Channel> {
            self.fetched.lock().push(channel_id);
            self.channels
                .iter()
                .find(|c| c.id == channel_id)
                .cloned()
                .ok_or(DomainError::ChannelNotFound(channel_id))
        }

        async fn create_message(
            &self,
            _channel_id: Snowflake,
            _message: &CreateMessage,
        ) -> RestResult<MessageData> {
            Err(DomainError::InternalError("not used".into()))
        }

        async fn edit_message(
            &self,
            _channel_id: Snowflake,
            _message_id: Snowflake,
            _content: &str,
        ) -> RestResult<MessageData> {
            Err(DomainError::InternalError("not used".into()))
        }

        async fn delete_message(&self, _: Snowflake, _: Snowflake) -> RestResult<()> {
            Err(DomainError::InternalError("not used".into()))
        }

        async fn create_interaction_response(
            &self,
            _: Snowflake,
            _: &str,
            _: &InteractionResponse,
        ) -> RestResult<()> {
            Ok(())
        }

        fn invalidate_token(&self) {}

        fn is_token_valid(&self) -> bool {
            true
        }
    }

    fn reducer_with(rest: FakeRest) -> (EventReducer, Arc<FakeRest>) {
        let rest = Arc::new(rest);
        let reducer = EventReducer::new(Cache::new_shared(), Arc::clone(&rest) as Arc<dyn RestGateway>);
        (reducer, rest)
    }

    fn reducer() -> EventReducer {
        reducer_with(FakeRest::default()).0
    }

    async fn feed(reducer: &EventReducer, t: &str, d: serde_json::Value) -> Option<Event> {
        let event = DispatchEvent::decode(t, &d).unwrap();
        reducer.apply(event).await
    }

    fn id(n: u64) -> Snowflake {
        Snowflake::new(n)
    }

    fn guild_create() -> serde_json::Value {
        json!({
            "id": "5",
            "name": "guild",
            "owner_id": "1",
            "member_count": 2,
            "channels": [
                {"id": "10", "type": 0, "name": "general"},
                {"id": "11", "type": 2, "name": "voice"}
            ],
            "roles": [
                {"id": "5", "name": "@everyone", "permissions": "1024"},
                {"id": "9", "name": "admin", "permissions": "8"}
            ],
            "members": [
                {"user": {"id": "1", "username": "owner"}, "roles": []},
                {"user": {"id": "2", "username": "mod"}, "roles": ["9"], "nick": "m"}
            ]
        })
    }

    #[tokio::test]
    async fn test_ready_sets_current_user() {
        let reducer = reducer();
        let event = feed(
            &reducer,
            "READY",
            json!({"user": {"id": "1", "username": "bot"}, "session_id": "s", "guilds": []}),
        )
        .await;

        assert!(matches!(event, Some(Event::Ready { ref user }) if user.id == id(1)));
        assert_eq!(reducer.cache().current_user_id(), Some(id(1)));
    }

    #[tokio::test]
    async fn test_guild_create_populates_everything() {
        let reducer = reducer();
        let event = feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let Some(Event::GuildCreate(guild)) = event else {
            panic!("expected GuildCreate");
        };
        assert_eq!(guild.channel_ids, vec![id(10), id(11)]);

        let cache = reducer.cache();
        assert_eq!(cache.channels().get(id(10)).unwrap().guild_id, Some(id(5)));
        assert_eq!(cache.roles().get(id(9)).unwrap().guild_id, id(5));
        assert_eq!(cache.member(id(5), id(2)).unwrap().nick.as_deref(), Some("m"));
        assert_eq!(cache.users().get(id(2)).unwrap().username, "mod");
    }

    #[tokio::test]
    async fn test_repeated_create_does_not_duplicate() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;
        feed(&reducer, "GUILD_CREATE", guild_create()).await;
        feed(
            &reducer,
            "CHANNEL_CREATE",
            json!({"id": "10", "type": 0, "guild_id": "5", "name": "general"}),
        )
        .await;

        let stats = reducer.cache().stats();
        assert_eq!(stats.guilds, 1);
        assert_eq!(stats.channels, 2);
        assert_eq!(stats.roles, 2);
        assert_eq!(stats.members, 2);
        assert_eq!(reducer.cache().guilds().get(id(5)).unwrap().channel_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_guild_create_drops_stale_children() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let mut snapshot = guild_create();
        snapshot["channels"] = json!([{"id": "10", "type": 0, "name": "general"}]);
        snapshot["roles"] = json!([{"id": "5", "name": "@everyone", "permissions": "1024"}]);
        feed(&reducer, "GUILD_CREATE", snapshot).await;

        let cache = reducer.cache();
        assert!(cache.channels().get(id(11)).is_none());
        assert!(cache.roles().get(id(9)).is_none());
        assert_eq!(cache.guilds().get(id(5)).unwrap().channel_ids, vec![id(10)]);
        assert!(cache.member(id(5), id(2)).is_some());
    }

    #[tokio::test]
    async fn test_guild_delete_cascades_channels() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let event = feed(&reducer, "GUILD_DELETE", json!({"id": "5"})).await;
        assert!(matches!(
            event,
            Some(Event::GuildDelete { guild: Some(_), unavailable: false, .. })
        ));

        let cache = reducer.cache();
        assert!(cache.channels().get(id(10)).is_none());
        assert!(cache.channels().get(id(11)).is_none());
        assert!(cache.roles().get(id(9)).is_none());
        assert!(cache.member(id(5), id(2)).is_none());
    }

    #[tokio::test]
    async fn test_role_update_reports_before_and_after() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let event = feed(
            &reducer,
            "GUILD_ROLE_UPDATE",
            json!({"guild_id": "5", "role": {"id": "9", "name": "demoted", "permissions": "16"}}),
        )
        .await;

        let Some(Event::RoleUpdate { old, new }) = event else {
            panic!("expected RoleUpdate");
        };
        assert_eq!(old.unwrap().permissions, Permissions::ADMINISTRATOR);
        assert_eq!(new.permissions, Permissions::MANAGE_CHANNELS);
        assert_eq!(new.guild_id, id(5));

        let resolver = PermissionResolver::new(reducer.cache().as_ref());
        assert!(!resolver.has_permission(id(5), id(2), Permissions::BAN_MEMBERS));
    }

    #[tokio::test]
    async fn test_admin_role_grants_everything() {
        let reducer = reducer();
        feed(
            &reducer,
            "GUILD_ROLE_CREATE",
            json!({"guild_id": "5", "role": {"id": "9", "permissions": "8"}}),
        )
        .await;

        let role = reducer.cache().roles().get(id(9)).unwrap();
        assert!(PermissionResolver::role_has(&role, "MANAGE_CHANNELS"));
    }

    #[tokio::test]
    async fn test_member_update_patches_roles_only() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let event = feed(
            &reducer,
            "GUILD_MEMBER_UPDATE",
            json!({"guild_id": "5", "user": {"id": "2", "username": "mod"}, "roles": []}),
        )
        .await;

        let Some(Event::MemberUpdate { old, new }) = event else {
            panic!("expected MemberUpdate");
        };
        assert_eq!(old.unwrap().roles, vec![id(9)]);
        assert!(new.roles.is_empty());
        assert_eq!(new.nick.as_deref(), Some("m"));
    }

    #[tokio::test]
    async fn test_member_add_and_remove_track_count() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        feed(
            &reducer,
            "GUILD_MEMBER_ADD",
            json!({"guild_id": "5", "user": {"id": "3", "username": "new"}, "roles": []}),
        )
        .await;
        assert_eq!(reducer.cache().guilds().get(id(5)).unwrap().member_count, 3);
        assert!(reducer.cache().member(id(5), id(3)).is_some());

        let event = feed(
            &reducer,
            "GUILD_MEMBER_REMOVE",
            json!({"guild_id": "5", "user": {"id": "3", "username": "new"}}),
        )
        .await;
        assert!(matches!(event, Some(Event::MemberRemove { member: Some(_), .. })));
        assert_eq!(reducer.cache().guilds().get(id(5)).unwrap().member_count, 2);
    }

    #[tokio::test]
    async fn test_user_update() {
        let reducer = reducer();
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let event = feed(
            &reducer,
            "USER_UPDATE",
            json!({"id": "2", "username": "renamed"}),
        )
        .await;
        let Some(Event::UserUpdate { old, new }) = event else {
            panic!("expected UserUpdate");
        };
        assert_eq!(old.unwrap().username, "mod");
        assert_eq!(new.username, "renamed");
    }

    #[tokio::test]
    async fn test_message_backfills_uncached_channel() {
        let (reducer, rest) = reducer_with(FakeRest {
            channels: vec![Channel::new_text(id(77), id(5), "fetched")],
            ..FakeRest::default()
        });

        let event = feed(
            &reducer,
            "MESSAGE_CREATE",
            json!({
                "id": "100",
                "channel_id": "77",
                "author": {"id": "2", "username": "mod"},
                "content": "hi",
                "mentions": [{"id": "3", "username": "pinged"}]
            }),
        )
        .await;

        let Some(Event::MessageCreate(message)) = event else {
            panic!("expected MessageCreate");
        };
        assert_eq!(*rest.fetched.lock(), vec![id(77)]);
        assert_eq!(message.channel().unwrap().name.as_deref(), Some("fetched"));
        assert_eq!(message.author().unwrap().username, "mod");
        assert_eq!(message.mentions().len(), 1);
    }

    #[tokio::test]
    async fn test_message_update_without_author() {
        let (reducer, rest) = reducer_with(FakeRest::default());
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        let event = feed(
            &reducer,
            "MESSAGE_UPDATE",
            json!({"id": "100", "channel_id": "10", "guild_id": "5", "embeds": []}),
        )
        .await;

        let Some(Event::MessageUpdate(message)) = event else {
            panic!("expected MessageUpdate");
        };
        assert_eq!(message.id, id(100));
        assert!(message.author_id.is_none());
        assert!(message.author().is_none());
        assert_eq!(message.channel().unwrap().name.as_deref(), Some("general"));
        assert!(rest.fetched.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cached_channel_is_not_fetched() {
        let (reducer, rest) = reducer_with(FakeRest::default());
        feed(&reducer, "GUILD_CREATE", guild_create()).await;

        feed(
            &reducer,
            "MESSAGE_CREATE",
            json!({"id": "100", "channel_id": "10", "guild_id": "5", "author": {"id": "2", "username": "mod"}}),
        )
        .await;
        assert!(rest.fetched.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_backfill_still_delivers() {
        let (reducer, rest) = reducer_with(FakeRest::default());
        let event = feed(
            &reducer,
            "INTERACTION_CREATE",
            json!({
                "id": "200",
                "application_id": "1",
                "type": 2,
                "channel_id": "404",
                "user": {"id": "3", "username": "dm-user"},
                "token": "tok"
            }),
        )
        .await;

        let Some(Event::InteractionCreate(interaction)) = event else {
            panic!("expected InteractionCreate");
        };
        assert_eq!(*rest.fetched.lock(), vec![id(404)]);
        assert!(interaction.channel().is_none());
        assert_eq!(interaction.user().unwrap().username, "dm-user");
    }

    #[tokio::test]
    async fn test_unknown_event_produces_nothing() {
        let reducer = reducer();
        assert!(feed(&reducer, "TYPING_START", json!({})).await.is_none());
    }
}
