//! Event dispatcher
//!
//! Listener registry plus a broadcast stream. Nothing is delivered until the
//! session is marked ready, so listeners never see a half-built cache.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::{Event, EventKind};

/// Capacity of the broadcast stream; slow subscribers lag past this
const BROADCAST_BUFFER: usize = 256;

/// Handle returned by `on`/`once`, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    callback: Callback,
}

pub struct EventDispatcher {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
    ready: AtomicBool,
    stream: broadcast::Sender<Event>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        let (stream, _) = broadcast::channel(BROADCAST_BUFFER);
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            ready: AtomicBool::new(false),
            stream,
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn register<F>(&self, kind: EventKind, once: bool, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Listener {
            id,
            kind,
            once,
            callback: Arc::new(callback),
        });
        id
    }

    /// Call `callback` for every `kind` event
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, false, callback)
    }

    /// Call `callback` for the next `kind` event only
    pub fn once<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, true, callback)
    }

    /// Remove a listener; false if it was already gone
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Receive every delivered event as an owned value
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.stream.subscribe()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().iter().filter(|l| l.kind == kind).count()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Deliver an event to matching listeners in registration order
    ///
    /// No-op before ready. Matching `once` listeners are removed before any
    /// callback runs, and callbacks run outside the lock, so a callback may
    /// register or remove listeners freely. Returns how many listeners ran.
    pub fn emit(&self, event: &Event) -> usize {
        if !self.is_ready() {
            tracing::trace!(event = %event.kind(), "Dropping event before ready");
            return 0;
        }

        let kind = event.kind();
        let callbacks: Vec<Callback> = {
            let mut listeners = self.listeners.lock();
            let matched = listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| Arc::clone(&l.callback))
                .collect();
            listeners.retain(|l| !(l.once && l.kind == kind));
            matched
        };

        for callback in &callbacks {
            callback(event);
        }

        // No subscribers is not an error
        let _ = self.stream.send(event.clone());

        callbacks.len()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.lock().len())
            .field("ready", &self.is_ready())
            .finish()
    }
}
