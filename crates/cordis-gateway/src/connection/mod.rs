//! Connection management
//!
//! The supervisor task, the session state it maintains, and the heartbeat
//! and writer tasks spawned for each socket.

mod heartbeat;
mod session;
mod supervisor;
mod writer;

pub use session::{Session, SharedSession, SocketState};
pub use supervisor::{Command, ConnectionSupervisor};
