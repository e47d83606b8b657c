//! Per-connection HTTP/1 handler.
//!
//! hyper owns parsing and keep-alive; every request on the connection goes
//! through the cache-aside middleware, except the stats path when enabled.

use std::convert::Infallible;
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use stash_config::ProxyConfig;
use stash_http::ProxyBody;
use stash_proxy::Upstream;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, instrument};

use crate::cache_aside::CacheAside;
use crate::stats::{is_stats_request, stats_response};

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, proxy, cfg),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection<S, U>(
    stream: S,
    client_addr: SocketAddr,
    proxy: Arc<CacheAside<U>>,
    cfg: Arc<ProxyConfig>,
) -> anyhow::Result<()>
where
    S: ClientStream,
    U: Upstream,
{
    info!(target: "stash::worker", "Handling new client connection");

    let service = service_fn(move |req: Request<Incoming>| {
        let proxy = proxy.clone();
        let cfg = cfg.clone();
        async move { Ok::<_, Infallible>(handle_request(req, client_addr, &proxy, &cfg).await) }
    });

    http1::Builder::new()
        .keep_alive(true)
        .serve_connection(TokioIo::new(stream), service)
        .await
        .context("HTTP/1 connection error")?;

    Ok(())
}

async fn handle_request<U: Upstream>(
    req: Request<Incoming>,
    client_addr: SocketAddr,
    proxy: &CacheAside<U>,
    cfg: &ProxyConfig,
) -> Response<ProxyBody> {
    debug!(
        target: "stash::worker",
        method = %req.method(),
        uri = %req.uri(),
        "Parsed HTTP request line"
    );

    if cfg.cache().stats_endpoint() && is_stats_request(&req) {
        return stats_response(&req, client_addr, proxy.store().map(|s| s.as_ref()));
    }

    proxy.handle(req.map(|body| body.boxed())).await
}
