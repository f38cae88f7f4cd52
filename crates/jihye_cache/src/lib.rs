//! Time-bounded key/value caching.
//!
//! This crate provides the cache consulted on every incoming message to
//! resolve a guild's command prefix without a round trip to the settings
//! store. Entries carry an optional TTL; expired entries are never observable
//! through any read, whether or not they have been physically purged yet.

#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod shared;

pub use cache::{TimedCache, TimedEntry};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{PrefixCacheConfig, PrefixCacheConfigBuilder};
pub use shared::SharedTimedCache;
