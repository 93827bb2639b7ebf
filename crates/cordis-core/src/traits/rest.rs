//! Request/response API port
//!
//! Entity methods and the reducer's cache-miss backfill go through this trait.
//! Implementations own URL templates, authentication, and rate-limit retries.

use async_trait::async_trait;
use serde::Serialize;

use crate::entities::{Channel, MessageData, MessageReference};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for request operations
pub type RestResult<T> = Result<T, DomainError>;

/// Body of a create-message request
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

impl CreateMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_reference: None,
        }
    }

    /// Mark this message as a reply to `message_id`
    pub fn reply_to(mut self, message_id: Snowflake) -> Self {
        self.message_reference = Some(MessageReference {
            message_id: Some(message_id),
            channel_id: None,
            guild_id: None,
        });
        self
    }
}

/// Body of an interaction callback
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: InteractionResponseData,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionResponseData {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl InteractionResponse {
    /// CHANNEL_MESSAGE_WITH_SOURCE callback type
    pub const CHANNEL_MESSAGE: u8 = 4;
    /// EPHEMERAL message flag
    pub const EPHEMERAL: u64 = 1 << 6;

    /// Reply visible in the channel (or only to the invoker when `ephemeral`)
    pub fn message(content: impl Into<String>, ephemeral: bool) -> Self {
        Self {
            kind: Self::CHANNEL_MESSAGE,
            data: InteractionResponseData {
                content: content.into(),
                flags: ephemeral.then_some(Self::EPHEMERAL),
            },
        }
    }
}

#[async_trait]
pub trait RestGateway: Send + Sync {
    /// Fetch a channel; `ChannelNotFound` when the server reports it unknown
    async fn get_channel(&self, channel_id: Snowflake) -> RestResult<Channel>;

    async fn create_message(
        &self,
        channel_id: Snowflake,
        message: &CreateMessage,
    ) -> RestResult<MessageData>;

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> RestResult<MessageData>;

    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> RestResult<()>;

    async fn create_interaction_response(
        &self,
        interaction_id: Snowflake,
        token: &str,
        response: &InteractionResponse,
    ) -> RestResult<()>;

    /// Drop the credential; every later request fails with `TokenInvalidated`
    fn invalidate_token(&self);

    fn is_token_valid(&self) -> bool;
}
