use http::Method;

pub struct CachePolicy;

impl CachePolicy {
    /// Only GET is served from or written to the cache. Everything else goes
    /// straight to the upstream.
    pub fn is_cacheable(method: &Method) -> bool {
        *method == Method::GET
    }
}
