use std::time::Duration;

use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in minutes. 0 turns caching off.
    pub ttl_minutes: u64,
    /// Serve hit/miss counters on `GET /_stash/cache` (loopback only).
    pub stats_endpoint: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 5,
            stats_endpoint: false,
        }
    }
}

impl CacheConfig {
    /// `None` when caching is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        match self.ttl_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
        }
    }

    pub fn stats_endpoint(&self) -> bool {
        self.stats_endpoint
    }
}
