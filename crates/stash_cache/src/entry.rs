use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tokio::time::Instant;

/// One cached upstream response.
///
/// Built only by [`crate::CacheStore::put`], so `expires_at` is always the
/// insertion instant plus the store TTL. Never mutated once stored.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes, expires_at: Instant) -> Self {
        Self {
            status,
            headers,
            body,
            expires_at,
        }
    }

    /// An entry is stale from the instant it reaches `expires_at`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
