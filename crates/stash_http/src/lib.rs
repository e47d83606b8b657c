//! HTTP plumbing shared by the forwarder and the cache middleware.

pub mod body;
pub mod headers;
pub mod responses;
pub mod sink;

pub use body::ProxyBody;
pub use sink::{ClientResponse, ResponseSink};

use http::HeaderName;

/// Header carrying the cache verdict (`HIT`, `MISS` or `BYPASS`).
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
