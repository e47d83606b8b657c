use std::time::Duration;

use serde::Deserialize;

// =======================================================
// UPSTREAM CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin base URL; request path and query are appended to it.
    pub url: String,
    /// Per-request client timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://httpbin.org".into(),
            timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
