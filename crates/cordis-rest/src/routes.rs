//! Endpoint table
//!
//! Every request the client makes is one `Route`. The route owns its HTTP
//! method, its path, and what a 404 from it means.

use cordis_core::{DomainError, Snowflake};
use reqwest::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GetChannel {
        channel_id: Snowflake,
    },
    CreateMessage {
        channel_id: Snowflake,
    },
    EditMessage {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
    DeleteMessage {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
    InteractionCallback {
        interaction_id: Snowflake,
    },
}

impl Route {
    pub fn method(&self) -> Method {
        match self {
            Self::GetChannel { .. } => Method::GET,
            Self::CreateMessage { .. } | Self::InteractionCallback { .. } => Method::POST,
            Self::EditMessage { .. } => Method::PATCH,
            Self::DeleteMessage { .. } => Method::DELETE,
        }
    }

    /// Path relative to the API base; interaction callbacks also need the token
    pub fn path(&self, interaction_token: Option<&str>) -> String {
        match self {
            Self::GetChannel { channel_id } => format!("/channels/{channel_id}"),
            Self::CreateMessage { channel_id } => format!("/channels/{channel_id}/messages"),
            Self::EditMessage {
                channel_id,
                message_id,
            }
            | Self::DeleteMessage {
                channel_id,
                message_id,
            } => format!("/channels/{channel_id}/messages/{message_id}"),
            Self::InteractionCallback { interaction_id } => format!(
                "/interactions/{interaction_id}/{}/callback",
                interaction_token.unwrap_or_default()
            ),
        }
    }

    /// Interaction callbacks authenticate with the interaction token, not the bot token
    pub fn needs_auth(&self) -> bool {
        !matches!(self, Self::InteractionCallback { .. })
    }

    /// Domain error for a 404 on this route, when there is a specific one
    pub fn not_found(&self) -> Option<DomainError> {
        match *self {
            Self::GetChannel { channel_id } | Self::CreateMessage { channel_id } => {
                Some(DomainError::ChannelNotFound(channel_id))
            }
            Self::EditMessage { message_id, .. } | Self::DeleteMessage { message_id, .. } => {
                Some(DomainError::MessageNotFound(message_id))
            }
            Self::InteractionCallback { .. } => None,
        }
    }

    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetChannel { .. } => "get_channel",
            Self::CreateMessage { .. } => "create_message",
            Self::EditMessage { .. } => "edit_message",
            Self::DeleteMessage { .. } => "delete_message",
            Self::InteractionCallback { .. } => "interaction_callback",
        }
    }
}
