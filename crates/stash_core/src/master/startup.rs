use std::sync::Arc;

use stash_cache::CacheStore;
use tracing::{info, warn};

use super::Master;

impl Master {
    pub(super) fn log_startup(&self) {
        info!(target: "stash::master", "Starting STASH MASTER");
        info!(
            target: "stash::master",
            listen = %self.cfg.server().listen_addr(),
            upstream = %self.cfg.upstream().url(),
            timeout = ?self.cfg.upstream().timeout(),
            ttl_minutes = self.cfg.cache().ttl_minutes,
            log_level = %self.cfg.log().level(),
            "Configuration loaded"
        );
    }

    /// Creates the response store and its sweeper. `None` when the TTL is 0,
    /// in which case every request is forwarded uncached.
    pub(super) fn start_cache(&self) -> Option<Arc<CacheStore>> {
        let Some(ttl) = self.cfg.cache().ttl() else {
            warn!(
                target: "stash::master",
                "Cache TTL is 0; caching is disabled and every request goes upstream"
            );
            return None;
        };

        let store = Arc::new(CacheStore::new(ttl));
        store.spawn_sweeper();
        info!(target: "stash::master", ttl = ?ttl, "Response cache ready");
        Some(store)
    }
}
