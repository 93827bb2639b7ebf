//! # cordis-cache
//!
//! In-memory mirror of the state delivered by the gateway.
//!
//! ## Features
//!
//! - **EntityCache**: generic id-keyed store with insertion-ordered snapshots
//! - **Cache**: one store per entity kind plus per-guild member stores
//! - **Cascades**: guild removal drops its channels, roles, and members
//!
//! ## Example
//!
//! ```ignore
//! use cordis_cache::Cache;
//! use cordis_core::{Channel, Guild, Snowflake};
//!
//! let cache = Cache::new_shared();
//! cache.insert_guild(Guild::new(guild_id, "guild", owner_id));
//! cache.insert_channel(Channel::new_text(channel_id, guild_id, "general"));
//!
//! let removed = cache.remove_guild(guild_id);
//! assert!(cache.channels().get(channel_id).is_none());
//! ```

pub mod store;

pub use store::{Cache, CacheStats, EntityCache, RemovedGuild};
