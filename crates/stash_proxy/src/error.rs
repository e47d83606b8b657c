use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// Connect, DNS, or protocol failure talking to the origin.
    #[error("upstream request failed: {0}")]
    Transport(#[source] BoxError),

    #[error("reading upstream body failed: {0}")]
    Body(#[from] hyper::Error),
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Timeout(_))
    }

    /// Message plus every source, joined: hyper-util's client errors only say
    /// "client error (Connect)" at the top level.
    pub fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            let msg = err.to_string();
            if !out.contains(&msg) {
                out.push_str(": ");
                out.push_str(&msg);
            }
            source = err.source();
        }
        out
    }
}
