use std::sync::Arc;

use anyhow::Context;
use stash_config::ProxyConfig;
use stash_proxy::Forwarder;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::cache_aside::CacheAside;

mod accept;
mod startup;

use accept::{accept_loop, bind_listener};

pub struct Master {
    cfg: Arc<ProxyConfig>,
}

impl Master {
    pub fn new(cfg: ProxyConfig) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    /// Binds the configured address and serves until the process is stopped.
    #[instrument(skip(self), fields(
        listen = %self.cfg.server().listen_addr(),
        upstream = %self.cfg.upstream().url(),
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_startup();
        let listen_addr = self.cfg.server().listen_addr();
        let listener = bind_listener(&listen_addr).await?;
        self.serve(listener).await
    }

    /// Runs the proxy on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let upstream = self.cfg.upstream();
        let forwarder = Forwarder::new(upstream.url(), upstream.timeout())
            .with_context(|| format!("invalid upstream url '{}'", upstream.url()))?;

        let store = self.start_cache();
        let proxy = Arc::new(CacheAside::new(forwarder, store));

        info!(
            target: "stash::master",
            "Master initialized. Waiting for incoming connections (Ctrl+C to stop)..."
        );

        accept_loop(listener, proxy, self.cfg.clone()).await
    }
}
