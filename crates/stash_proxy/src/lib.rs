//! Upstream side of the proxy: forwarding requests to the origin and
//! capturing what comes back.

mod capture;
mod error;
mod forwarder;
mod path;

pub use capture::{ResponseCapture, forward_into};
pub use error::{BoxError, ForwardError};
pub use forwarder::{Forwarder, Upstream};
