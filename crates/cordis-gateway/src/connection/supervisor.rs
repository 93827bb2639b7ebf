//! Connection supervisor
//!
//! Owns the socket for the lifetime of the client. A single task runs
//! [`ConnectionSupervisor::run`], looping over connection attempts: open the
//! socket, resume or identify, read frames until the socket drops or the
//! client intervenes, then connect again. Frames are handled to completion
//! one at a time, which makes the reducer the cache's only writer.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use cordis_common::ClientConfig;

use super::heartbeat::spawn_heartbeat;
use super::session::{SharedSession, SocketState};
use super::writer::{self, Outbound, WsStream, OUTBOUND_BUFFER};
use crate::broadcast::{Event, EventDispatcher};
use crate::error::{GatewayError, GatewayResult};
use crate::events::DispatchEvent;
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload, OpCode};
use crate::reducer::EventReducer;

/// Queue depth for client commands
const COMMAND_BUFFER: usize = 16;

type WsReader = SplitStream<WsStream>;

/// Requests from the client facade
#[derive(Debug)]
pub enum Command {
    /// Drop the current socket and connect again
    Reconnect,
    /// Queue a frame on the live socket; dropped while disconnected
    Send(GatewayMessage),
    /// Stop for good; acknowledged once the socket is shut
    Disconnect(oneshot::Sender<()>),
}

/// How a connection attempt ended, other than by a fault
#[derive(Debug)]
enum Exit {
    Shutdown(Option<oneshot::Sender<()>>),
    Restart,
}

/// What the read loop does after a frame
#[derive(Debug)]
enum Step {
    Continue,
    /// READY applied; start the settle timer
    Settle,
    Exit(Exit),
}

pub struct ConnectionSupervisor {
    config: Arc<ClientConfig>,
    session: SharedSession,
    reducer: EventReducer,
    dispatcher: Arc<EventDispatcher>,
    commands: mpsc::Receiver<Command>,
    /// Consecutive failed attempts; reset once a session is established
    attempt: u32,
    /// READY event held back until the settle delay elapses; survives a resume
    pending_ready: Option<Event>,
}

impl ConnectionSupervisor {
    /// Build a supervisor and the sender used to control it
    pub fn new(
        config: Arc<ClientConfig>,
        session: SharedSession,
        reducer: EventReducer,
        dispatcher: Arc<EventDispatcher>,
    ) -> (Self, mpsc::Sender<Command>) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let supervisor = Self {
            config,
            session,
            reducer,
            dispatcher,
            commands,
            attempt: 0,
            pending_ready: None,
        };
        (supervisor, tx)
    }

    /// Drive connection attempts until disconnected
    ///
    /// Transport faults never end this loop; they only schedule a reconnect.
    pub async fn run(mut self) {
        loop {
            let exit = match self.connect_and_run().await {
                Ok(exit) => exit,
                Err(e) => match self.recover(e).await {
                    Some(exit) => exit,
                    None => continue,
                },
            };

            match exit {
                Exit::Restart => {
                    self.session.lock().set_state(SocketState::Reconnecting);
                    info!("Restarting gateway connection");
                }
                Exit::Shutdown(ack) => {
                    self.session.lock().set_state(SocketState::Disconnected);
                    info!("Gateway supervisor stopped");
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                    return;
                }
            }
        }
    }

    // =========================================================================
    // Connection attempt
    // =========================================================================

    async fn connect_and_run(&mut self) -> GatewayResult<Exit> {
        let url = {
            let mut session = self.session.lock();
            session.set_state(SocketState::Connecting);
            session.target_url().to_owned()
        };
        info!(url = %url, "Connecting to gateway");

        let connect = tokio::time::timeout(self.config.connect_timeout, connect_async(url.as_str()));
        tokio::pin!(connect);
        let ws = loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => {
                    if let Some(exit) = Self::idle_command(cmd) {
                        return Ok(exit);
                    }
                }

                result = &mut connect => {
                    let (ws, _) = result.map_err(|_| GatewayError::ConnectTimeout)??;
                    break ws;
                }
            }
        };
        debug!(url = %url, "Socket open");

        let (sink, mut reader) = ws.split();
        let (outbound, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let writer_task = writer::spawn_writer(sink, rx);
        let mut heartbeat: Option<JoinHandle<()>> = None;

        let result = self.read_loop(&mut reader, &outbound, &mut heartbeat).await;

        if let Some(handle) = heartbeat.take() {
            handle.abort();
        }
        if let Ok(exit) = &result {
            // 1000 ends the session server-side; any other code keeps it resumable
            let code = match exit {
                Exit::Shutdown(_) => WsCloseCode::Normal,
                Exit::Restart => WsCloseCode::Restart,
            };
            let frame = CloseFrame {
                code,
                reason: "".into(),
            };
            let _ = outbound.send(Message::Close(Some(frame))).await;
        }
        drop(outbound);
        writer::flush(writer_task).await;

        result
    }

    async fn read_loop(
        &mut self,
        reader: &mut WsReader,
        outbound: &Outbound,
        heartbeat: &mut Option<JoinHandle<()>>,
    ) -> GatewayResult<Exit> {
        let resume = self.session.lock().on_open(&self.config.token);
        if let Some(resume) = resume {
            info!(session_id = %resume.session_id, seq = ?resume.seq, "Resuming session");
            writer::send(outbound, &GatewayMessage::resume(&resume)?).await?;
        }

        let mut settle: Option<Instant> = None;
        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(message)) => writer::send(outbound, &message).await?,
                    other => {
                        if let Some(exit) = Self::idle_command(other) {
                            return Ok(exit);
                        }
                    }
                },

                () = until(settle) => {
                    settle = None;
                    self.finish_ready();
                }

                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match self.handle_frame(&text, outbound, heartbeat).await {
                            Ok(Step::Continue) => {}
                            Ok(Step::Settle) => {
                                settle = Some(Instant::now() + self.config.ready_settle);
                            }
                            Ok(Step::Exit(exit)) => return Ok(exit),
                            Err(e) if e.is_frame_fault() => {
                                warn!(error = %e, "Dropping malformed frame");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.and_then(|f| CloseCode::from_u16(f.code.into()));
                        return Err(GatewayError::Closed(code));
                    }
                    Some(Ok(Message::Binary(_))) => debug!("Ignoring binary frame"),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(GatewayError::Closed(None)),
                },
            }
        }
    }

    /// Commands that make sense without a live socket
    fn idle_command(cmd: Option<Command>) -> Option<Exit> {
        match cmd {
            // Every sender gone: the client was dropped
            None => Some(Exit::Shutdown(None)),
            Some(Command::Disconnect(ack)) => Some(Exit::Shutdown(Some(ack))),
            Some(Command::Reconnect) => Some(Exit::Restart),
            Some(Command::Send(message)) => {
                debug!(op = %message.op, "No live socket; dropping outbound frame");
                None
            }
        }
    }

    /// Log a failed attempt and wait out the reconnect delay
    ///
    /// Returns an exit if the client intervened during the wait.
    async fn recover(&mut self, err: GatewayError) -> Option<Exit> {
        match err.close_code() {
            Some(code) if !code.should_reconnect() => {
                warn!(code = code.as_u16(), reason = code.description(), "Gateway rejected the session");
            }
            Some(code) => {
                warn!(code = code.as_u16(), reason = code.description(), "Gateway closed the socket");
            }
            None => warn!(error = %err, "Gateway connection lost"),
        }

        if !err.can_resume() {
            self.session.lock().reset();
            self.pending_ready = None;
            debug!("Session discarded; next connection identifies");
        }

        let delay = self.config.reconnect.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.session.lock().set_state(SocketState::Reconnecting);
        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = self.attempt,
            "Scheduling reconnect"
        );

        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => {
                    if let Some(exit) = Self::idle_command(cmd) {
                        return Some(exit);
                    }
                }

                () = tokio::time::sleep_until(deadline) => return None,
            }
        }
    }

    // =========================================================================
    // Frame handling
    // =========================================================================

    async fn handle_frame(
        &mut self,
        text: &str,
        outbound: &Outbound,
        heartbeat: &mut Option<JoinHandle<()>>,
    ) -> GatewayResult<Step> {
        let frame = GatewayMessage::from_json(text)?;
        trace!(op = %frame.op, seq = ?frame.s, event = ?frame.t, "Frame received");

        match frame.op {
            OpCode::Dispatch => self.handle_dispatch(frame).await,

            OpCode::Hello => {
                let hello = frame.as_hello().ok_or_else(|| {
                    GatewayError::Protocol("hello without heartbeat_interval".into())
                })?;
                let interval = Duration::from_millis(hello.heartbeat_interval);

                let task = spawn_heartbeat(interval, Arc::clone(&self.session), outbound.clone());
                if let Some(previous) = heartbeat.replace(task) {
                    previous.abort();
                }
                debug!(interval_ms = hello.heartbeat_interval, "Heartbeat started");

                let identify = self.session.lock().on_hello(interval);
                if identify {
                    self.identify(outbound).await?;
                }
                Ok(Step::Continue)
            }

            OpCode::HeartbeatAck => {
                let latency = {
                    let mut session = self.session.lock();
                    session.ack_received();
                    session.latency()
                };
                trace!(
                    latency_ms = ?latency.map(|l| l.as_millis() as u64),
                    "Heartbeat acknowledged"
                );
                Ok(Step::Continue)
            }

            OpCode::Heartbeat => {
                info!("Server requested a heartbeat; reconnecting");
                Ok(Step::Exit(Exit::Restart))
            }

            OpCode::Reconnect => {
                info!("Server requested a reconnect");
                Ok(Step::Exit(Exit::Restart))
            }

            OpCode::InvalidSession => {
                let resumable = frame.as_invalid_session().unwrap_or(false);
                warn!(resumable, "Session invalidated by server");
                if !resumable {
                    self.session.lock().reset();
                }
                Ok(Step::Exit(Exit::Restart))
            }

            op => {
                debug!(op = %op, "Ignoring client-only opcode");
                Ok(Step::Continue)
            }
        }
    }

    async fn identify(&mut self, outbound: &Outbound) -> GatewayResult<()> {
        // A fresh session rebuilds the cache from READY and GUILD_CREATE
        self.reducer.cache().clear();
        self.pending_ready = None;
        self.dispatcher.set_ready(false);

        let payload = IdentifyPayload::new(self.config.token.clone(), self.config.intents);
        writer::send(outbound, &GatewayMessage::identify(&payload)?).await?;
        info!(intents = self.config.intents, "Identify sent");
        Ok(())
    }

    async fn handle_dispatch(&mut self, frame: GatewayMessage) -> GatewayResult<Step> {
        if let Some(seq) = frame.s {
            self.session.lock().record_sequence(seq);
        }
        let name = frame
            .t
            .ok_or_else(|| GatewayError::Protocol("dispatch without event type".into()))?;
        let event = DispatchEvent::decode(&name, &frame.d)?;

        let mut step = Step::Continue;
        match &event {
            DispatchEvent::Ready(ready) => {
                self.session
                    .lock()
                    .on_ready(ready.session_id.clone(), ready.resume_gateway_url.clone());
                self.attempt = 0;
                info!(
                    session_id = %ready.session_id,
                    user_id = %ready.user.id,
                    guilds = ready.guilds.len(),
                    "Session established"
                );
                step = Step::Settle;
            }
            DispatchEvent::Resumed => {
                self.session.lock().on_resumed();
                self.dispatcher.set_ready(true);
                self.attempt = 0;
                info!(seq = ?frame.s, "Session resumed");

                // The socket dropped inside the settle window; READY goes out first
                if let Some(ready) = self.pending_ready.take() {
                    debug!("Delivering READY held across the reconnect");
                    self.dispatcher.emit(&ready);
                }
            }
            _ => {}
        }

        if let Some(event) = self.reducer.apply(event).await {
            if matches!(event, Event::Ready { .. }) {
                self.pending_ready = Some(event);
            } else {
                self.dispatcher.emit(&event);
            }
        }
        Ok(step)
    }

    /// Settle delay elapsed: open the dispatcher and deliver READY
    fn finish_ready(&mut self) {
        self.session.lock().mark_ready();
        self.dispatcher.set_ready(true);

        let stats = self.reducer.cache().stats();
        info!(
            guilds = stats.guilds,
            channels = stats.channels,
            users = stats.users,
            "Session ready"
        );

        if let Some(event) = self.pending_ready.take() {
            self.dispatcher.emit(&event);
        }
    }
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("state", &self.session.lock().state())
            .field("attempt", &self.attempt)
            .finish()
    }
}

/// Resolves at `deadline`, or never if there is none
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
