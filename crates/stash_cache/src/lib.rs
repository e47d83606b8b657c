//! In-memory, TTL-bounded response cache.
//!
//! The store keeps one entry per request key (path + query). Entries expire a
//! fixed TTL after insertion; reads never return an expired entry, and a
//! background sweeper removes whatever nobody reads again.

mod entry;
mod error;
mod key;
mod policy;
mod stats;
mod store;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use key::CacheKey;
pub use policy::CachePolicy;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
