//! Gateway client
//!
//! The public entry point. Wires the REST client, cache, reducer, dispatcher
//! and supervisor together and exposes the lifecycle (`connect`,
//! `disconnect`), listener registration, and cache queries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cordis_cache::Cache;
use cordis_common::{ClientConfig, ClientError, ClientResult};
use cordis_core::{PermissionResolver, RestGateway, User};
use cordis_rest::HttpRestClient;

use crate::broadcast::{Event, EventDispatcher, EventKind, ListenerId};
use crate::connection::{Command, ConnectionSupervisor, Session, SharedSession, SocketState};
use crate::protocol::{Activity, GatewayMessage, PresenceUpdatePayload, UserStatus};
use crate::reducer::EventReducer;

/// Upper bound on waiting for the supervisor to close the socket
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GatewayClient {
    config: Arc<ClientConfig>,
    rest: Arc<HttpRestClient>,
    cache: Arc<Cache>,
    dispatcher: Arc<EventDispatcher>,
    session: SharedSession,
    commands: mpsc::Sender<Command>,
    /// Supervisor waiting for the first `connect()`
    pending: Mutex<Option<ConnectionSupervisor>>,
    task: Mutex<Option<JoinHandle<()>>>,
    terminated: AtomicBool,
}

impl GatewayClient {
    /// # Errors
    /// Fails when the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let config = Arc::new(config);
        let rest = Arc::new(HttpRestClient::new(
            config.api_url.clone(),
            config.token.clone(),
            config.http_timeout,
        )?);

        let cache = Cache::new_shared();
        let dispatcher = EventDispatcher::new_shared();
        let session = Session::new_shared(config.gateway_url.clone());
        let reducer = EventReducer::new(
            Arc::clone(&cache),
            Arc::clone(&rest) as Arc<dyn RestGateway>,
        );

        let (supervisor, commands) = ConnectionSupervisor::new(
            Arc::clone(&config),
            Arc::clone(&session),
            reducer,
            Arc::clone(&dispatcher),
        );

        Ok(Self {
            config,
            rest,
            cache,
            dispatcher,
            session,
            commands,
            pending: Mutex::new(Some(supervisor)),
            task: Mutex::new(None),
            terminated: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the gateway connection, or restart it if one is open
    ///
    /// Returns immediately; listen for [`EventKind::Ready`] to know when the
    /// cache is populated.
    ///
    /// # Errors
    /// `SessionTerminated` after [`disconnect`](Self::disconnect)
    pub async fn connect(&self) -> ClientResult<()> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(ClientError::SessionTerminated);
        }

        let pending = self.pending.lock().take();
        if let Some(supervisor) = pending {
            info!(url = %self.config.gateway_url, "Starting gateway supervisor");
            *self.task.lock() = Some(tokio::spawn(supervisor.run()));
            return Ok(());
        }

        debug!("Connect requested on a running client; restarting");
        self.commands
            .send(Command::Reconnect)
            .await
            .map_err(|_| ClientError::SessionTerminated)
    }

    /// Close the connection for good and invalidate the token
    ///
    /// The heartbeat stops and the socket is closed before this returns.
    /// A disconnected client cannot be reused.
    pub async fn disconnect(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatcher.set_ready(false);

        // Never started: nothing to close
        let never_started = self.pending.lock().take().is_some();

        if !never_started {
            let (ack, done) = oneshot::channel();
            if self.commands.send(Command::Disconnect(ack)).await.is_ok()
                && tokio::time::timeout(DISCONNECT_TIMEOUT, done).await.is_err()
            {
                warn!("Supervisor did not acknowledge disconnect in time");
            }
            let task = self.task.lock().take();
            if let Some(task) = task {
                task.abort();
            }
        }

        self.rest.invalidate_token();
        self.session.lock().set_state(SocketState::Disconnected);
        info!("Gateway client disconnected");
    }

    /// Send a presence update (op 3) on the live socket
    ///
    /// Dropped silently while the socket is down.
    pub async fn update_presence(
        &self,
        status: UserStatus,
        activity: Option<Activity>,
    ) -> ClientResult<()> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(ClientError::SessionTerminated);
        }
        let frame = GatewayMessage::presence_update(&PresenceUpdatePayload::new(status, activity))
            .map_err(ClientError::internal)?;
        self.commands
            .send(Command::Send(frame))
            .await
            .map_err(|_| ClientError::SessionTerminated)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.dispatcher.on(kind, callback)
    }

    pub fn once<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.dispatcher.once(kind, callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.dispatcher.off(id)
    }

    /// Stream of every delivered event
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.dispatcher.subscribe()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn rest(&self) -> &Arc<HttpRestClient> {
        &self.rest
    }

    pub fn permissions(&self) -> PermissionResolver<'_> {
        PermissionResolver::new(self.cache.as_ref())
    }

    /// The logged-in identity, once READY has been applied
    pub fn user(&self) -> Option<User> {
        self.cache.current_user()
    }

    pub fn state(&self) -> SocketState {
        self.session.lock().state()
    }

    pub fn is_ready(&self) -> bool {
        self.dispatcher.is_ready()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.lock().session_id().map(str::to_owned)
    }

    /// Heartbeat round trip
    pub fn latency(&self) -> Option<Duration> {
        self.session.lock().latency()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("terminated", &self.terminated.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GatewayClient {
        GatewayClient::new(ClientConfig::new("tok").with_gateway_url("ws://127.0.0.1:9")).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_client_is_disconnected() {
        let client = client();
        assert_eq!(client.state(), SocketState::Disconnected);
        assert!(client.user().is_none());
        assert!(!client.is_ready());
        assert!(client.session_id().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_is_terminal() {
        let client = client();
        client.disconnect().await;

        assert!(!client.rest().is_token_valid());
        assert!(matches!(client.connect().await, Err(ClientError::SessionTerminated)));
        assert!(matches!(
            client.update_presence(UserStatus::Online, None).await,
            Err(ClientError::SessionTerminated)
        ));

        // Second call is a no-op
        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_after_connect_stops_supervisor() {
        let client = client();
        client.connect().await.unwrap();
        client.connect().await.unwrap();
        client.disconnect().await;

        assert_eq!(client.state(), SocketState::Disconnected);
        assert!(client.task.lock().is_none());
    }

    #[tokio::test]
    async fn test_listener_registration() {
        let client = client();
        let id = client.on(EventKind::MessageCreate, |_| {});
        assert!(client.off(id));
        assert!(!client.off(id));
    }
}
