//! Integration test utilities for the gateway client
//!
//! An in-process mock gateway that plays scripted frames and records what
//! the client sends back, plus frame fixtures.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
