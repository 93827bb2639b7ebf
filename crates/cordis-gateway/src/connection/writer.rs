//! Outbound socket half
//!
//! One task owns the sink; everything else queues frames through an mpsc
//! sender so heartbeats, handshakes and presence updates never interleave
//! mid-frame.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::GatewayMessage;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type Outbound = mpsc::Sender<Message>;

/// Queue depth between producers and the writer task
pub(crate) const OUTBOUND_BUFFER: usize = 64;

/// How long a closing writer may keep flushing
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Encode a frame and queue it
pub(crate) async fn send(outbound: &Outbound, message: &GatewayMessage) -> GatewayResult<()> {
    let text = message.to_json()?;
    trace!(op = %message.op, "Queueing frame");
    outbound
        .send(Message::Text(text))
        .await
        .map_err(|_| GatewayError::ChannelClosed)
}

pub(crate) fn spawn_writer(mut sink: WsSink, mut rx: mpsc::Receiver<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = message.is_close();
            if let Err(e) = sink.send(message).await {
                debug!(error = %e, "Writer send failed");
                break;
            }
            if closing {
                break;
            }
        }
        let _ = sink.close().await;
    })
}

/// Wait for the writer to drain, aborting it if it takes too long
///
/// Every sender must already be dropped or the writer never sees EOF.
pub(crate) async fn flush(mut writer: JoinHandle<()>) {
    tokio::select! {
        _ = &mut writer => {}
        () = tokio::time::sleep(FLUSH_TIMEOUT) => {
            debug!("Writer did not drain in time; aborting");
            writer.abort();
        }
    }
}
