use std::fmt;

use http::Uri;

/// Cache key: the request path plus its query string, e.g. `/get?a=1`.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(path_and_query: impl Into<String>) -> Self {
        Self(path_and_query.into())
    }

    pub fn from_uri(uri: &Uri) -> Self {
        let pq = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Self::new(pq)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
