//! Session state
//!
//! Everything the supervisor needs to survive a dropped socket: where to
//! reconnect, which session to resume, and the last dispatch sequence.
//! Shared with the heartbeat task and the client facade behind a mutex;
//! the supervisor is the only writer apart from heartbeat bookkeeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::protocol::ResumePayload;

pub type SharedSession = Arc<Mutex<Session>>;

/// Socket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketState {
    /// No socket; initial state and terminal state after `disconnect()`
    Disconnected,
    /// Socket opening, waiting for hello
    Connecting,
    /// Identify sent, waiting for READY
    Identifying,
    /// Resume sent, waiting for RESUMED or a replay
    Resuming,
    /// READY applied and settled, or RESUMED received
    Ready,
    /// Socket dropped; a reconnect is scheduled
    Reconnecting,
}

impl SocketState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Ready => "ready",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SocketState,
    initial_url: String,
    resume_url: Option<String>,
    session_id: Option<String>,
    last_seq: Option<u64>,
    heartbeat_interval: Option<Duration>,
    ready_at: Option<DateTime<Utc>>,

    // Heartbeat bookkeeping
    heartbeat_sent_at: Option<Instant>,
    awaiting_ack: bool,
    latency: Option<Duration>,
}

impl Session {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            state: SocketState::Disconnected,
            initial_url: initial_url.into(),
            resume_url: None,
            session_id: None,
            last_seq: None,
            heartbeat_interval: None,
            ready_at: None,
            heartbeat_sent_at: None,
            awaiting_ack: false,
            latency: None,
        }
    }

    #[must_use]
    pub fn new_shared(initial_url: impl Into<String>) -> SharedSession {
        Arc::new(Mutex::new(Self::new(initial_url)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn state(&self) -> SocketState {
        self.state
    }

    pub fn set_state(&mut self, state: SocketState) {
        if self.state != state {
            tracing::trace!(from = %self.state, to = %state, "Socket state changed");
            self.state = state;
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    #[inline]
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.ready_at
    }

    /// Round trip of the most recently acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// A session id from an earlier READY that the server may still honour
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some()
    }

    /// URL the next connect should open
    ///
    /// The resume URL from READY once a session exists, the configured
    /// gateway URL otherwise.
    pub fn target_url(&self) -> &str {
        match (&self.session_id, &self.resume_url) {
            (Some(_), Some(url)) => url,
            _ => &self.initial_url,
        }
    }

    // =========================================================================
    // Handshake transitions
    // =========================================================================

    /// Socket opened; returns the resume request to send if there is a session to resume
    pub fn on_open(&mut self, token: &str) -> Option<ResumePayload> {
        self.heartbeat_sent_at = None;
        self.awaiting_ack = false;

        match &self.session_id {
            Some(session_id) => {
                let payload = ResumePayload {
                    token: token.to_owned(),
                    session_id: session_id.clone(),
                    seq: self.last_seq,
                };
                self.set_state(SocketState::Resuming);
                Some(payload)
            }
            None => {
                self.set_state(SocketState::Connecting);
                None
            }
        }
    }

    /// Hello received; true when a fresh identify must follow
    pub fn on_hello(&mut self, interval: Duration) -> bool {
        self.heartbeat_interval = Some(interval);
        if self.state == SocketState::Resuming {
            return false;
        }
        self.last_seq = None;
        self.set_state(SocketState::Identifying);
        true
    }

    /// Record a dispatch sequence; never moves backwards within a session
    pub fn record_sequence(&mut self, seq: u64) {
        match self.last_seq {
            Some(last) if seq < last => {
                tracing::warn!(last_seq = last, seq, "Ignoring out-of-order sequence");
            }
            _ => self.last_seq = Some(seq),
        }
    }

    /// READY applied; the session can be resumed from here on
    pub fn on_ready(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_url = resume_url;
    }

    /// Settle delay after READY elapsed
    pub fn mark_ready(&mut self) {
        self.ready_at = Some(Utc::now());
        self.set_state(SocketState::Ready);
    }

    pub fn on_resumed(&mut self) {
        self.ready_at.get_or_insert_with(Utc::now);
        self.set_state(SocketState::Ready);
    }

    /// Forget the session so the next connect identifies from scratch
    pub fn reset(&mut self) {
        self.session_id = None;
        self.resume_url = None;
        self.last_seq = None;
        self.ready_at = None;
    }

    // =========================================================================
    // Heartbeat bookkeeping
    // =========================================================================

    /// A heartbeat is going out; true if the previous one was never acknowledged
    pub fn heartbeat_sent(&mut self) -> bool {
        let missed = self.awaiting_ack;
        self.awaiting_ack = true;
        self.heartbeat_sent_at = Some(Instant::now());
        missed
    }

    pub fn ack_received(&mut self) {
        self.awaiting_ack = false;
        if let Some(sent) = self.heartbeat_sent_at.take() {
            self.latency = Some(sent.elapsed());
        }
    }
}
