//! Cache-aside middleware.
//!
//! Per request: non-GET (or no usable store) goes straight to the upstream;
//! GET is looked up by path + query, served from the store on a hit, and on a
//! miss fetched through a [`ResponseCapture`], stored, then served.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use stash_cache::{CacheEntry, CacheKey, CachePolicy, CacheStore};
use stash_http::headers::strip_hop_by_hop;
use stash_http::responses::{send_502, send_504};
use stash_http::{ClientResponse, ProxyBody, ResponseSink, X_CACHE};
use stash_proxy::{ForwardError, ResponseCapture, Upstream, forward_into};
use tracing::{debug, error, instrument, warn};

/// Value of the `X-Cache` header on every response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Not eligible for caching, or no store to cache in.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

pub struct CacheAside<U> {
    upstream: U,
    store: Option<Arc<CacheStore>>,
}

impl<U: Upstream> CacheAside<U> {
    /// `store = None` runs the proxy with caching disabled: every request is
    /// forwarded and a warning is logged for each one.
    pub fn new(upstream: U, store: Option<Arc<CacheStore>>) -> Self {
        Self { upstream, store }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub fn store(&self) -> Option<&Arc<CacheStore>> {
        self.store.as_ref()
    }

    #[instrument(
        skip(self, req),
        fields(method = %req.method(), uri = %req.uri())
    )]
    pub async fn handle(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let Some(store) = self.store.as_ref() else {
            warn!(target: "stash::core", "Cache store unavailable; no responses will be cached");
            return self.bypass(req).await;
        };

        if !CachePolicy::is_cacheable(req.method()) {
            debug!(target: "stash::core", "Forwarding non-GET request");
            store.stats().record_bypass();
            return self.bypass(req).await;
        }

        let key = CacheKey::from_uri(req.uri());
        match store.get(&key) {
            Ok(Some(entry)) => {
                debug!(target: "stash::core", cache_key = %key, "Cache hit");
                hit(entry)
            }
            Ok(None) => {
                debug!(target: "stash::core", cache_key = %key, "Cache miss");
                self.miss(store, key, req).await
            }
            Err(e) => {
                warn!(
                    target: "stash::core",
                    cache_key = %key,
                    error = %e,
                    "Cache lookup failed; forwarding without caching"
                );
                self.bypass(req).await
            }
        }
    }

    async fn bypass(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        match self.upstream.forward(req).await {
            Ok(mut response) => {
                let headers = response.headers_mut();
                strip_hop_by_hop(headers);
                headers.insert(X_CACHE, CacheStatus::Bypass.header_value());
                response
            }
            Err(e) => gateway_error(&e),
        }
    }

    async fn miss(&self, store: &CacheStore, key: CacheKey, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let mut capture = ResponseCapture::new();
        if let Err(e) = forward_into(&self.upstream, req, &mut capture).await {
            return gateway_error(&e);
        }

        let (status, headers, body) = capture.into_parts();
        if let Err(e) = store.put(key.clone(), status, headers.clone(), body.clone()) {
            warn!(
                target: "stash::core",
                cache_key = %key,
                error = %e,
                "Could not add response to cache; serving it anyway"
            );
        }

        respond(status, &headers, &body, CacheStatus::Miss)
    }
}

fn hit(entry: CacheEntry) -> Response<ProxyBody> {
    respond(entry.status, &entry.headers, &entry.body, CacheStatus::Hit)
}

/// Writes a buffered response to the client. `X-Cache` goes in after the
/// stored headers so it always replaces an upstream value.
fn respond(status: StatusCode, headers: &HeaderMap, body: &Bytes, cache: CacheStatus) -> Response<ProxyBody> {
    let mut sink = ClientResponse::new();
    for (name, value) in headers {
        sink.add_header(name.clone(), value.clone());
    }
    sink.set_header(X_CACHE, cache.header_value());
    sink.set_status(status);
    sink.write_body(body);
    sink.into_response()
}

fn gateway_error(err: &ForwardError) -> Response<ProxyBody> {
    let detail = err.describe();
    error!(target: "stash::core", error = %detail, "Upstream failed; returning gateway error");
    if err.is_timeout() {
        send_504(&detail)
    } else {
        send_502(&detail)
    }
}
