//! HTTP implementation of `RestGateway`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use cordis_core::{
    Channel, CreateMessage, DomainError, InteractionResponse, MessageData, RestGateway,
    RestResult, Snowflake,
};
use parking_lot::RwLock;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::{map_status, transport, RateLimitBody};
use crate::routes::Route;

/// Retries after a 429 before giving up
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/cordis-rs/cordis, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Request/response API client
///
/// Holds the bot token until `invalidate_token` is called; after that every
/// authenticated request fails locally with `TokenInvalidated`.
pub struct HttpRestClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpRestClient {
    /// # Errors
    /// Fails when the TLS backend cannot be initialized
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| transport(&e))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(Some(token.into())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(&self) -> RestResult<String> {
        self.token
            .read()
            .as_ref()
            .map(|token| format!("Bot {token}"))
            .ok_or(DomainError::TokenInvalidated)
    }

    fn build(&self, route: &Route, interaction_token: Option<&str>) -> RestResult<RequestBuilder> {
        let url = format!("{}{}", self.base_url, route.path(interaction_token));
        let mut request = self.http.request(route.method(), url);
        if route.needs_auth() {
            request = request.header(header::AUTHORIZATION, self.authorization()?);
        }
        Ok(request)
    }

    /// Send a request, sleeping through rate limits
    async fn send<B>(
        &self,
        route: Route,
        interaction_token: Option<&str>,
        body: Option<&B>,
    ) -> RestResult<Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let mut request = self.build(&route, interaction_token)?;
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| transport(&e))?;
            let status = response.status();
            debug!(route = route.name(), status = status.as_u16(), "Request completed");

            if status.is_success() {
                return Ok(response);
            }

            let bytes = response.bytes().await.map_err(|e| transport(&e))?;

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
                if let Ok(limit) = serde_json::from_slice::<RateLimitBody>(&bytes) {
                    attempt += 1;
                    warn!(
                        route = route.name(),
                        retry_after_ms = limit.delay().as_millis() as u64,
                        global = limit.global,
                        attempt,
                        "Rate limited"
                    );
                    tokio::time::sleep(limit.delay()).await;
                    continue;
                }
            }

            return Err(map_status(&route, status, &bytes));
        }
    }

    async fn json<T, B>(&self, route: Route, body: Option<&B>) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self.send(route, None, body).await?;
        response.json().await.map_err(|e| {
            DomainError::Transport(format!("invalid {} response: {e}", route.name()))
        })
    }
}

#[async_trait]
impl RestGateway for HttpRestClient {
    #[instrument(skip_all, fields(channel_id = %channel_id))]
    async fn get_channel(&self, channel_id: Snowflake) -> RestResult<Channel> {
        self.json::<_, ()>(Route::GetChannel { channel_id }, None).await
    }

    #[instrument(skip_all, fields(channel_id = %channel_id))]
    async fn create_message(
        &self,
        channel_id: Snowflake,
        message: &CreateMessage,
    ) -> RestResult<MessageData> {
        self.json(Route::CreateMessage { channel_id }, Some(message))
            .await
    }

    #[instrument(skip_all, fields(channel_id = %channel_id, message_id = %message_id))]
    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> RestResult<MessageData> {
        let body = serde_json::json!({ "content": content });
        self.json(
            Route::EditMessage {
                channel_id,
                message_id,
            },
            Some(&body),
        )
        .await
    }

    #[instrument(skip_all, fields(channel_id = %channel_id, message_id = %message_id))]
    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> RestResult<()> {
        self.send::<()>(
            Route::DeleteMessage {
                channel_id,
                message_id,
            },
            None,
            None,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(interaction_id = %interaction_id))]
    async fn create_interaction_response(
        &self,
        interaction_id: Snowflake,
        token: &str,
        response: &InteractionResponse,
    ) -> RestResult<()> {
        // Callbacks carry their own token but stop with the session
        if !self.is_token_valid() {
            return Err(DomainError::TokenInvalidated);
        }
        self.send(
            Route::InteractionCallback { interaction_id },
            Some(token),
            Some(response),
        )
        .await?;
        Ok(())
    }

    fn invalidate_token(&self) {
        if self.token.write().take().is_some() {
            debug!("Bot token invalidated");
        }
    }

    fn is_token_valid(&self) -> bool {
        self.token.read().is_some()
    }
}

impl fmt::Debug for HttpRestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRestClient")
            .field("base_url", &self.base_url)
            .field("token_valid", &self.is_token_valid())
            .finish()
    }
}
