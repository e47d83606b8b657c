use std::net::SocketAddr;

use http::{Method, Request, Response};
use serde_json::json;
use stash_cache::CacheStore;
use stash_http::ProxyBody;
use stash_http::responses::{send_404, send_405_with_allow, send_json};
use tracing::debug;

/// Reserved path for the cache counters. Never forwarded when the endpoint
/// is enabled.
pub const STATS_PATH: &str = "/_stash/cache";

pub fn is_stats_request<B>(req: &Request<B>) -> bool {
    req.uri().path() == STATS_PATH
}

/// Answers `GET /_stash/cache` for loopback clients. Everyone else gets a
/// 404 as if the path did not exist.
pub fn stats_response<B>(
    req: &Request<B>,
    client_addr: SocketAddr,
    store: Option<&CacheStore>,
) -> Response<ProxyBody> {
    if !client_addr.ip().is_loopback() {
        debug!(target: "stash::core", client_addr = %client_addr, "Stats requested from non-loopback client");
        return send_404();
    }
    if req.method() != Method::GET {
        return send_405_with_allow("GET");
    }

    let body = match store {
        Some(store) => {
            let stats = store.stats().snapshot();
            json!({
                "enabled": true,
                "ttl_secs": store.ttl().as_secs(),
                "entries": store.len().ok(),
                "hits": stats.hits,
                "misses": stats.misses,
                "bypasses": stats.bypasses,
                "insertions": stats.insertions,
                "evictions": stats.evictions,
            })
        }
        None => json!({ "enabled": false }),
    };
    send_json(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::{STATS_PATH, is_stats_request, stats_response};
    use bytes::Bytes;
    use http::{HeaderMap, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use stash_cache::{CacheKey, CacheStore};
    use std::net::SocketAddr;
    use std::time::Duration;

    fn req(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).expect("request")
    }

    fn local() -> SocketAddr {
        "127.0.0.1:50000".parse().expect("addr")
    }

    #[test]
    fn only_the_exact_path_is_intercepted() {
        assert!(is_stats_request(&req(Method::GET, STATS_PATH)));
        assert!(is_stats_request(&req(Method::GET, "/_stash/cache?pretty=1")));
        assert!(!is_stats_request(&req(Method::GET, "/_stash/cache/x")));
        assert!(!is_stats_request(&req(Method::GET, "/")));
    }

    #[tokio::test]
    async fn loopback_get_reports_counters() {
        let store = CacheStore::new(Duration::from_secs(60));
        store
            .put(CacheKey::from("/a"), StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"a"))
            .expect("put");
        let _ = store.get(&CacheKey::from("/a")).expect("get");
        let _ = store.get(&CacheKey::from("/b")).expect("get");

        let response = stats_response(&req(Method::GET, STATS_PATH), local(), Some(&store));
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.expect("body").to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(value["enabled"], true);
        assert_eq!(value["entries"], 1);
        assert_eq!(value["hits"], 1);
        assert_eq!(value["misses"], 1);
        assert_eq!(value["ttl_secs"], 60);
    }

    #[test]
    fn remote_clients_do_not_see_the_endpoint() {
        let remote: SocketAddr = "203.0.113.7:4000".parse().expect("addr");
        let response = stats_response(&req(Method::GET, STATS_PATH), remote, None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_methods_are_rejected() {
        let response = stats_response(&req(Method::POST, STATS_PATH), local(), None);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "GET");
    }
}
