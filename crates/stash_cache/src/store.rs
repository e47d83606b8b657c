use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::stats::CacheStats;

/// Lower bound for the sweep period; `tokio::time::interval` rejects zero.
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(100);

/// Upper bound for the sweep period. Sweeping more often than the TTL is
/// harmless and keeps the first deadline representable.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Map plus a time-ordered expiry index.
///
/// Invariant: for every `(k, e)` in `entries` there is exactly one
/// `(e.expires_at, k)` in `expiry`, and nothing else is in `expiry`.
#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    expiry: BTreeSet<(Instant, CacheKey)>,
}

impl Inner {
    fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        let expires_at = entry.expires_at;
        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.expiry.remove(&(old.expires_at, key.clone()));
        }
        self.expiry.insert((expires_at, key));
    }

    fn remove_if_expired(&mut self, key: &CacheKey, now: Instant) -> bool {
        let expires_at = match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => entry.expires_at,
            _ => return false,
        };
        self.entries.remove(key);
        self.expiry.remove(&(expires_at, key.clone()));
        true
    }

    /// Pops every expired key from the front of the index.
    fn pop_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some((expires_at, _)) = self.expiry.first() {
            if *expires_at > now {
                break;
            }
            if let Some((_, key)) = self.expiry.pop_first() {
                self.entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}

/// Thread-safe response store with a fixed TTL.
///
/// A single reader/writer lock covers the whole map: lookups run in
/// parallel, inserts and removals are serialized. The lock is never held
/// across an `.await`.
#[derive(Debug)]
pub struct CacheStore {
    ttl: Duration,
    inner: RwLock<Inner>,
    stats: CacheStats,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(Inner::default()),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, CacheError> {
        self.inner.read().map_err(|_| CacheError::Unavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, CacheError> {
        self.inner.write().map_err(|_| CacheError::Unavailable)
    }

    /// Returns a copy of the entry for `key` if it exists and has not expired.
    ///
    /// Expiry is checked here, independently of the sweeper. An expired entry
    /// found by a read is removed before returning.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let now = Instant::now();
        {
            let inner = self.read()?;
            match inner.entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return Ok(None);
                }
                Some(entry) if !entry.is_expired_at(now) => {
                    self.stats.record_hit();
                    return Ok(Some(entry.clone()));
                }
                Some(_) => {}
            }
        }

        // Re-checked under the write lock: a concurrent put may have refreshed it.
        let mut inner = self.write()?;
        if inner.remove_if_expired(key, now) {
            self.stats.record_evictions(1);
            debug!(target: "stash::cache", cache_key = %key, "Dropped expired entry on read");
        }
        self.stats.record_miss();
        Ok(None)
    }

    /// Inserts or replaces the entry for `key`, expiring one TTL from now.
    pub fn put(
        &self,
        key: CacheKey,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<CacheEntry, CacheError> {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .ok_or(CacheError::TtlOutOfRange(self.ttl))?;
        let entry = CacheEntry::new(status, headers, body, expires_at);
        let mut inner = self.write()?;
        debug!(
            target: "stash::cache",
            cache_key = %key,
            status = entry.status.as_u16(),
            body_len = entry.body.len(),
            "Stored response"
        );
        inner.insert(key, entry.clone());
        self.stats.record_insertion();
        Ok(entry)
    }

    /// Removes every entry whose TTL has elapsed. Returns how many went away.
    pub fn sweep(&self) -> Result<usize, CacheError> {
        let removed = self.write()?.pop_expired(Instant::now());
        self.stats.record_evictions(removed);
        Ok(removed)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Poisons the lock, as a writer panicking mid-update would.
    #[cfg(any(test, feature = "test-util"))]
    pub fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.write();
            panic!("poison the cache lock");
        }));
    }

    /// Starts the background sweep, ticking once per TTL (capped at a day)
    /// for as long as the runtime lives.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let period = self.ttl.clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(target: "stash::cache", period = ?period, "Starting cache sweeper");

        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                match store.sweep() {
                    Ok(0) => {}
                    Ok(removed) => {
                        debug!(target: "stash::cache", removed, "Swept expired entries");
                    }
                    Err(e) => {
                        warn!(target: "stash::cache", error = %e, "Sweep skipped");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CacheStore;
    use crate::{CacheError, CacheKey};
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time;

    const TTL: Duration = Duration::from_secs(5 * 60);

    fn put_text(store: &CacheStore, key: &str, body: &'static str) {
        store
            .put(
                CacheKey::from(key),
                StatusCode::OK,
                HeaderMap::new(),
                Bytes::from_static(body.as_bytes()),
            )
            .expect("store available");
    }

    #[tokio::test(start_paused = true)]
    async fn get_returns_fresh_entry() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/foo", "bar");

        let entry = store
            .get(&CacheKey::from("/foo"))
            .expect("store available")
            .expect("entry present");
        assert_eq!(entry.status, StatusCode::OK);
        assert_eq!(entry.body, Bytes::from_static(b"bar"));
    }

    #[tokio::test(start_paused = true)]
    async fn get_reports_absent_after_ttl() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/foo", "bar");

        time::advance(Duration::from_secs(6 * 60)).await;

        assert!(store.get(&CacheKey::from("/foo")).expect("store available").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_boundary_is_exclusive() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/edge", "x");
        let key = CacheKey::from("/edge");

        time::advance(TTL - Duration::from_millis(1)).await;
        assert!(store.get(&key).expect("store available").is_some());

        time::advance(Duration::from_millis(1)).await;
        assert!(store.get(&key).expect("store available").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_read_removes_entry_without_sweep() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/stale", "old");
        time::advance(TTL).await;

        assert_eq!(store.len().expect("store available"), 1);
        assert!(store.get(&CacheKey::from("/stale")).expect("store available").is_none());
        assert_eq!(store.len().expect("store available"), 0);
        assert_eq!(store.stats().snapshot().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_entry_restarts_its_ttl() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/foo", "first");
        time::advance(Duration::from_secs(3 * 60)).await;
        put_text(&store, "/foo", "second");
        time::advance(Duration::from_secs(3 * 60)).await;

        // The first insert's deadline has passed, the second one's has not.
        assert_eq!(store.sweep().expect("store available"), 0);
        let entry = store
            .get(&CacheKey::from("/foo"))
            .expect("store available")
            .expect("entry present");
        assert_eq!(entry.body, Bytes::from_static(b"second"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let store = CacheStore::new(TTL);
        put_text(&store, "/a", "a");
        put_text(&store, "/b", "b");
        time::advance(Duration::from_secs(4 * 60)).await;
        put_text(&store, "/c", "c");
        time::advance(Duration::from_secs(2 * 60)).await;

        assert_eq!(store.sweep().expect("store available"), 2);
        assert_eq!(store.len().expect("store available"), 1);
        assert!(store.get(&CacheKey::from("/c")).expect("store available").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_untouched_entries_within_one_interval() {
        let store = Arc::new(CacheStore::new(TTL));
        let sweeper = store.spawn_sweeper();
        put_text(&store, "/idle", "zzz");
        assert_eq!(store.len().expect("store available"), 1);

        time::sleep(TTL + Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.len().expect("store available"), 0);
        sweeper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn headers_keep_every_value_in_order() {
        let store = CacheStore::new(TTL);
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        store
            .put(CacheKey::from("/cookies"), StatusCode::OK, headers, Bytes::new())
            .expect("store available");

        let entry = store
            .get(&CacheKey::from("/cookies"))
            .expect("store available")
            .expect("entry present");
        let values: Vec<_> = entry.headers.get_all("set-cookie").iter().collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_access_never_tears_entries() {
        let store = Arc::new(CacheStore::new(Duration::from_secs(60)));
        let mut tasks = Vec::new();

        for worker in 0..16u32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for i in 0..200u32 {
                    let n = worker * 1000 + i;
                    let key = CacheKey::new(format!("/k{}", i % 4));
                    let mut headers = HeaderMap::new();
                    headers.insert("x-n", HeaderValue::from(n));
                    store
                        .put(key.clone(), StatusCode::OK, headers, Bytes::from(n.to_string().repeat(8)))
                        .expect("store available");

                    if let Some(entry) = store.get(&key).expect("store available") {
                        let tag = entry.headers["x-n"].to_str().expect("ascii header").to_string();
                        assert_eq!(entry.body, Bytes::from(tag.repeat(8)));
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        for task in tasks {
            task.await.expect("worker finished");
        }
        assert_eq!(store.len().expect("store available"), 4);
    }

    #[test]
    fn poisoned_lock_reports_unavailable() {
        let store = CacheStore::new(TTL);
        store.poison();

        assert!(matches!(store.get(&CacheKey::from("/x")), Err(CacheError::Unavailable)));
        assert!(matches!(
            store.put(CacheKey::from("/x"), StatusCode::OK, HeaderMap::new(), Bytes::new()),
            Err(CacheError::Unavailable)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_ttl_fails_put_instead_of_panicking() {
        let store = CacheStore::new(Duration::MAX);
        let result = store.put(CacheKey::from("/x"), StatusCode::OK, HeaderMap::new(), Bytes::new());

        assert!(matches!(result, Err(CacheError::TtlOutOfRange(ttl)) if ttl == Duration::MAX));
        assert!(store.is_empty().expect("store available"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_survives_huge_ttl() {
        let store = Arc::new(CacheStore::new(Duration::MAX));
        let sweeper = store.spawn_sweeper();

        time::sleep(Duration::from_secs(2 * 24 * 60 * 60)).await;
        tokio::task::yield_now().await;

        assert!(!sweeper.is_finished());
        sweeper.abort();
    }
}
