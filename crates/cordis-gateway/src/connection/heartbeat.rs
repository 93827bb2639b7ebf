//! Heartbeat task
//!
//! Sends op 1 with the last dispatch sequence every `interval`. The handle is
//! owned by the connection attempt that started it and aborted when that
//! attempt ends.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{trace, warn};

use super::session::SharedSession;
use super::writer::{self, Outbound};
use crate::protocol::GatewayMessage;

pub(crate) fn spawn_heartbeat(
    interval: Duration,
    session: SharedSession,
    outbound: Outbound,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (missed, seq) = {
                let mut session = session.lock();
                (session.heartbeat_sent(), session.last_seq())
            };
            if missed {
                warn!(
                    interval_ms = interval.as_millis() as u64,
                    "Previous heartbeat was not acknowledged"
                );
            }

            if writer::send(&outbound, &GatewayMessage::heartbeat(seq)).await.is_err() {
                trace!("Outbound queue closed; stopping heartbeat");
                break;
            }
            trace!(seq = ?seq, "Heartbeat sent");
        }
    })
}
