//! Configuration structs

mod client_config;
mod reconnect;

pub use client_config::{ClientConfig, ConfigError, Environment};
pub use reconnect::ReconnectPolicy;
