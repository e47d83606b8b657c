use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing map can no longer be trusted (a writer panicked while
    /// holding the lock). Callers must skip caching, not fail the request.
    #[error("cache store unavailable")]
    Unavailable,

    /// `now + ttl` does not fit in an `Instant`.
    #[error("cache ttl {0:?} is out of range")]
    TtlOutOfRange(Duration),
}
