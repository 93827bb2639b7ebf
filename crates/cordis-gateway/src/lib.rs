//! # cordis-gateway
//!
//! Persistent gateway client: keeps one socket alive across drops, mirrors
//! the remote state into an in-memory cache, and delivers typed events to
//! listeners once the session is ready.
//!
//! ```no_run
//! use cordis_common::ClientConfig;
//! use cordis_gateway::{Event, EventKind, GatewayClient};
//!
//! # async fn demo() -> Result<(), cordis_common::ClientError> {
//! let client = GatewayClient::new(ClientConfig::from_env()?)?;
//! client.on(EventKind::MessageCreate, |event| {
//!     if let Event::MessageCreate(message) = event {
//!         println!("{}", message.content);
//!     }
//! });
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;
pub mod reducer;

pub use broadcast::{Event, EventDispatcher, EventKind, ListenerId};
pub use client::GatewayClient;
pub use connection::{ConnectionSupervisor, Session, SocketState};
pub use error::{GatewayError, GatewayResult};
pub use events::DispatchEvent;
pub use protocol::{Activity, Intents, UserStatus};
pub use reducer::EventReducer;
