//! Ports - what the domain needs from the outside world
//!
//! The cache crate implements [`EntityLookup`]; the REST crate implements
//! [`RestGateway`].

mod lookup;
mod rest;

pub use lookup::EntityLookup;
pub use rest::{CreateMessage, InteractionResponse, InteractionResponseData, RestGateway, RestResult};
