//! Entity stores

mod cache;
mod entity_cache;

pub use cache::{Cache, CacheStats, RemovedGuild};
pub use entity_cache::EntityCache;
