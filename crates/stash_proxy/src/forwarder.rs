use std::future::Future;
use std::time::Duration;

use http::{HeaderValue, Request, Response, header};
use http_body_util::BodyExt;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use stash_http::ProxyBody;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::ForwardError;
use crate::path::UpstreamBase;

/// Anything that can answer a proxied request on behalf of the origin.
///
/// The cache middleware only talks to the origin through this seam.
pub trait Upstream: Send + Sync + 'static {
    fn forward(
        &self,
        req: Request<ProxyBody>,
    ) -> impl Future<Output = Result<Response<ProxyBody>, ForwardError>> + Send;
}

// =======================================================
// FORWARDER
// =======================================================

/// Re-targets each request at `upstream.url`, keeping method, path, query,
/// headers and body, and sends it with a pooled hyper client.
///
/// The client timeout covers connect, request write and the response head.
/// The body streams back afterwards.
pub struct Forwarder {
    base: UpstreamBase,
    timeout: Duration,
    client: Client<HttpConnector, ProxyBody>,
}

impl Forwarder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ForwardError> {
        let base = UpstreamBase::parse(base_url)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            base,
            timeout,
            client,
        })
    }

    fn build_outbound(&self, req: Request<ProxyBody>) -> Result<Request<ProxyBody>, ForwardError> {
        let (parts, body) = req.into_parts();
        let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let target = self.base.join(path_and_query)?;

        let mut out = Request::new(body);
        *out.method_mut() = parts.method;
        *out.uri_mut() = target;
        *out.headers_mut() = parts.headers;

        // Transport concern: the origin must see its own name, not ours.
        let host = HeaderValue::from_str(self.base.authority().as_str()).map_err(|e| {
            ForwardError::InvalidTarget {
                target: self.base.authority().to_string(),
                reason: e.to_string(),
            }
        })?;
        out.headers_mut().insert(header::HOST, host);

        Ok(out)
    }
}

impl Upstream for Forwarder {
    #[instrument(
        skip(self, req),
        fields(method = %req.method(), uri = %req.uri())
    )]
    async fn forward(&self, req: Request<ProxyBody>) -> Result<Response<ProxyBody>, ForwardError> {
        let outbound = self.build_outbound(req)?;
        debug!(target: "stash::proxy", upstream = %outbound.uri(), "Forwarding request to upstream");

        let response = match timeout(self.timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let err = ForwardError::Transport(Box::new(e));
                warn!(target: "stash::proxy", error = %err.describe(), "Upstream request failed");
                return Err(err);
            }
            Err(_) => {
                warn!(target: "stash::proxy", timeout = ?self.timeout, "Upstream request timed out");
                return Err(ForwardError::Timeout(self.timeout));
            }
        };

        debug!(
            target: "stash::proxy",
            status = response.status().as_u16(),
            "Received upstream response"
        );
        Ok(response.map(|body| body.boxed()))
    }
}
