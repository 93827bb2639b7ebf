//! Event delivery to user code

mod dispatcher;
mod event;

pub use dispatcher::{EventDispatcher, ListenerId};
pub use event::{Event, EventKind};
