//! Message value object - built fresh from each message payload

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Channel, EntityContext, Guild, Member, MemberData, User};
use crate::error::DomainError;
use crate::resolver::PermissionResolver;
use crate::traits::{CreateMessage, RestResult};
use crate::value_objects::{Permissions, Snowflake};

/// Longest message content the vendor accepts, in characters
pub const MAX_CONTENT_LEN: usize = 2000;

/// Pointer to another message (replies, crossposts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
}

/// Message object as sent by both the gateway and the REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageData {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mentions: Vec<User>,
    #[serde(default)]
    pub member: Option<MemberData>,
    #[serde(default)]
    pub message_reference: Option<MessageReference>,
}

/// Partial message sent on MESSAGE_UPDATE
///
/// Only `id` and `channel_id` are guaranteed; embed unfurls arrive without
/// an author or content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdateData {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mentions: Option<Vec<User>>,
    #[serde(default)]
    pub member: Option<MemberData>,
}

/// Message value object
///
/// Holds ids only. `author`, `channel`, `guild` and `member` are looked up in
/// the cache on every call, so they reflect current state rather than the
/// snapshot the payload carried.
#[derive(Clone)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    /// Absent only on partial updates
    pub author_id: Option<Snowflake>,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub mention_ids: Vec<Snowflake>,
    pub reference: Option<MessageReference>,
    ctx: EntityContext,
}

impl Message {
    /// Build from a payload; embedded users are reduced to their ids
    pub fn new(data: MessageData, ctx: EntityContext) -> Self {
        Self {
            id: data.id,
            channel_id: data.channel_id,
            guild_id: data.guild_id,
            author_id: Some(data.author.id),
            content: data.content,
            timestamp: data.timestamp,
            edited_timestamp: data.edited_timestamp,
            mention_ids: data.mentions.iter().map(|u| u.id).collect(),
            reference: data.message_reference,
            ctx,
        }
    }

    /// Build from a partial update; fields the update omits stay empty
    pub fn from_update(data: MessageUpdateData, ctx: EntityContext) -> Self {
        Self {
            id: data.id,
            channel_id: data.channel_id,
            guild_id: data.guild_id,
            author_id: data.author.map(|u| u.id),
            content: data.content.unwrap_or_default(),
            timestamp: None,
            edited_timestamp: data.edited_timestamp,
            mention_ids: data
                .mentions
                .map(|users| users.iter().map(|u| u.id).collect())
                .unwrap_or_default(),
            reference: None,
            ctx,
        }
    }

    pub fn author(&self) -> Option<User> {
        self.author_id.and_then(|id| self.ctx.lookup.user(id))
    }

    pub fn channel(&self) -> Option<Channel> {
        self.ctx.lookup.channel(self.channel_id)
    }

    pub fn guild(&self) -> Option<Guild> {
        self.guild_id.and_then(|id| self.ctx.lookup.guild(id))
    }

    /// Author's membership in the message's guild (None in DMs)
    pub fn member(&self) -> Option<Member> {
        let author_id = self.author_id?;
        self.guild_id
            .and_then(|guild_id| self.ctx.lookup.member(guild_id, author_id))
    }

    /// Mentioned users that are still cached
    pub fn mentions(&self) -> Vec<User> {
        self.mention_ids
            .iter()
            .filter_map(|id| self.ctx.lookup.user(*id))
            .collect()
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reference
            .as_ref()
            .is_some_and(|r| r.message_id.is_some())
    }

    /// Check if the current identity wrote this message
    pub fn is_own(&self) -> bool {
        self.author_id
            .is_some_and(|id| self.ctx.lookup.current_user_id() == Some(id))
    }

    /// Send a reply in the same channel
    pub async fn reply(&self, content: impl Into<String>) -> RestResult<Message> {
        let content = content.into();
        validate_content(&content)?;

        let request = CreateMessage::new(content).reply_to(self.id);
        let data = self.ctx.rest.create_message(self.channel_id, &request).await?;
        Ok(Message::new(data, self.ctx.clone()))
    }

    /// Replace the content; only messages written by the current identity can be edited
    pub async fn edit(&self, content: impl Into<String>) -> RestResult<Message> {
        if !self.is_own() {
            return Err(DomainError::NotMessageAuthor);
        }
        let content = content.into();
        validate_content(&content)?;

        let data = self
            .ctx
            .rest
            .edit_message(self.channel_id, self.id, &content)
            .await?;
        Ok(Message::new(data, self.ctx.clone()))
    }

    /// Delete the message
    ///
    /// Someone else's message needs MANAGE_MESSAGES in its channel. When the
    /// channel is not cached the server makes the call.
    pub async fn delete(&self) -> RestResult<()> {
        if !self.is_own() {
            self.require_manage_messages()?;
        }
        self.ctx.rest.delete_message(self.channel_id, self.id).await
    }

    fn require_manage_messages(&self) -> Result<(), DomainError> {
        let me = self
            .ctx
            .lookup
            .current_user_id()
            .ok_or(DomainError::NotMessageAuthor)?;
        let Some(channel) = self.channel() else {
            return Ok(());
        };
        if !channel.is_guild_channel() {
            return Err(DomainError::NotMessageAuthor);
        }

        let granted =
            PermissionResolver::new(self.ctx.lookup.as_ref()).channel_permissions(&channel, me);
        if granted.contains(Permissions::MANAGE_MESSAGES) {
            Ok(())
        } else {
            Err(DomainError::MissingPermission("MANAGE_MESSAGES".to_string()))
        }
    }

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .field("author_id", &self.author_id)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// Reject content the server would refuse, before any request goes out
pub(crate) fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "message content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(DomainError::ContentTooLong {
            max: MAX_CONTENT_LEN,
        });
    }
    Ok(())
}
