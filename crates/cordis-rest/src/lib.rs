//! # cordis-rest
//!
//! reqwest-backed implementation of the `RestGateway` port: bot-token auth,
//! 429 retry, and translation of HTTP failures into `DomainError`.

pub mod client;
pub mod error;
pub mod routes;

pub use client::HttpRestClient;
pub use routes::Route;
