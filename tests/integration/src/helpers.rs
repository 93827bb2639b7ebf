//! Test helpers for integration tests
//!
//! `MockGateway` accepts WebSocket connections on an ephemeral port and runs
//! one script per accepted connection, in order. Every frame the client
//! sends is forwarded to the test; heartbeats are acknowledged automatically.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use cordis_common::{ClientConfig, ReconnectPolicy};
use cordis_gateway::protocol::{GatewayMessage, OpCode};
use cordis_gateway::{Event, EventKind, GatewayClient};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::fixtures::TEST_TOKEN;

/// How long any single expectation may wait
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

type ServerSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type ServerStream = SplitStream<WebSocketStream<TcpStream>>;

/// One step of a connection script
#[derive(Debug, Clone)]
pub enum Action {
    /// Send a frame
    Send(Value),
    /// Read client frames until one carries this op
    AwaitOp(OpCode),
    /// Pause without reading
    Wait(Duration),
    /// Close the socket with this code
    Close(u16),
}

/// Something the mock observed on a connection
#[derive(Debug, Clone)]
pub enum Inbound {
    Frame {
        connection: usize,
        frame: GatewayMessage,
    },
    Closed {
        connection: usize,
        code: Option<u16>,
    },
}

pub struct MockGateway {
    url: String,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    acceptor: JoinHandle<()>,
}

impl MockGateway {
    /// Listen on an ephemeral port; connection `n` runs `scripts[n]`
    ///
    /// Connections past the last script only read.
    pub async fn start(scripts: Vec<Vec<Action>>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, inbound) = mpsc::unbounded_channel();

        let acceptor = tokio::spawn(async move {
            let mut scripts = scripts.into_iter();
            let mut connection = 0;
            while let Ok((tcp, _)) = listener.accept().await {
                let script = scripts.next().unwrap_or_default();
                let tx = tx.clone();
                let index = connection;
                connection += 1;

                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(tcp).await {
                        serve(index, ws, script, tx).await;
                    }
                });
            }
        });

        Ok(Self {
            url: format!("ws://{addr}"),
            inbound,
            acceptor,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn next(&mut self) -> Result<Inbound> {
        tokio::time::timeout(STEP_TIMEOUT, self.inbound.recv())
            .await
            .context("timed out waiting for the client")?
            .context("mock gateway stopped")
    }

    /// Next frame with `op`, skipping heartbeats and closes
    ///
    /// Any other frame in between fails the expectation.
    pub async fn expect_op(&mut self, op: OpCode) -> Result<(usize, GatewayMessage)> {
        loop {
            match self.next().await? {
                Inbound::Frame { connection, frame } if frame.op == op => {
                    return Ok((connection, frame));
                }
                Inbound::Frame { frame, .. } if frame.op == OpCode::Heartbeat => {}
                Inbound::Frame { frame, .. } => bail!("expected {op}, client sent {frame}"),
                Inbound::Closed { .. } => {}
            }
        }
    }

    /// Next socket close observed on any connection
    pub async fn expect_closed(&mut self) -> Result<(usize, Option<u16>)> {
        loop {
            if let Inbound::Closed { connection, code } = self.next().await? {
                return Ok((connection, code));
            }
        }
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn serve(
    connection: usize,
    ws: WebSocketStream<TcpStream>,
    script: Vec<Action>,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let (mut sink, mut stream) = ws.split();

    for action in script {
        match action {
            Action::Send(frame) => {
                if sink.send(Message::Text(frame.to_string())).await.is_err() {
                    return;
                }
            }
            Action::Wait(duration) => tokio::time::sleep(duration).await,
            Action::AwaitOp(op) => loop {
                match read(connection, &mut stream, &mut sink, &inbound).await {
                    Some(frame) if frame.op == op => break,
                    Some(_) => {}
                    None => return,
                }
            },
            Action::Close(code) => {
                let frame = CloseFrame {
                    code: CloseCode::from(code),
                    reason: "".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }

    while read(connection, &mut stream, &mut sink, &inbound).await.is_some() {}
}

/// Next client frame; `None` once the socket is closed
async fn read(
    connection: usize,
    stream: &mut ServerStream,
    sink: &mut ServerSink,
    inbound: &mpsc::UnboundedSender<Inbound>,
) -> Option<GatewayMessage> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let Ok(frame) = GatewayMessage::from_json(&text) else {
                    continue;
                };
                if frame.op == OpCode::Heartbeat {
                    let ack = json!({"op": 11, "d": null}).to_string();
                    let _ = sink.send(Message::Text(ack)).await;
                }
                let _ = inbound.send(Inbound::Frame {
                    connection,
                    frame: frame.clone(),
                });
                return Some(frame);
            }
            Some(Ok(Message::Close(frame))) => {
                let code = frame.map(|f| u16::from(f.code));
                let _ = inbound.send(Inbound::Closed { connection, code });
                return None;
            }
            Some(Ok(_)) => {}
            Some(Err(_)) | None => {
                let _ = inbound.send(Inbound::Closed {
                    connection,
                    code: None,
                });
                return None;
            }
        }
    }
}

// ============================================================================
// Client side
// ============================================================================

/// Client config pointed at a mock, with short settle and reconnect delays
pub fn test_config(gateway_url: &str) -> ClientConfig {
    ClientConfig::new(TEST_TOKEN)
        .with_gateway_url(gateway_url)
        .with_api_url("http://127.0.0.1:9")
        .with_ready_settle(Duration::from_millis(50))
        .with_reconnect(ReconnectPolicy::Constant(Duration::from_millis(50)))
        .with_connect_timeout(Duration::from_secs(2))
}

pub fn test_client(gateway_url: &str) -> Result<GatewayClient> {
    Ok(GatewayClient::new(test_config(gateway_url))?)
}

/// Wait for the next delivered event of `kind`
pub async fn wait_for(events: &mut broadcast::Receiver<Event>, kind: EventKind) -> Result<Event> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if event.kind() == kind => return Ok(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => bail!("event stream closed"),
            }
        }
    };
    tokio::time::timeout(STEP_TIMEOUT, wait)
        .await
        .with_context(|| format!("timed out waiting for {kind}"))?
}

/// Poll `check` until it holds
pub async fn eventually<F>(mut check: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + STEP_TIMEOUT;
    while !check() {
        if tokio::time::Instant::now() > deadline {
            bail!("condition not met in time");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}
