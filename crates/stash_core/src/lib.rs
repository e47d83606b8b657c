//! Proxy runtime: the cache-aside middleware and the server that feeds it.

pub mod cache_aside;
pub mod master;
pub mod stats;
pub mod worker;

pub use cache_aside::{CacheAside, CacheStatus};
pub use master::Master;
