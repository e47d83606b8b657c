use std::sync::Arc;
use std::time::Duration;

use stash_config::ProxyConfig;
use stash_proxy::Upstream;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};

use crate::cache_aside::CacheAside;
use crate::worker::handle_connection;

/// Pause after a failed accept (fd exhaustion and the like) before retrying.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

pub(crate) async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(
        target: "stash::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "stash::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "stash::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

/// Accepts forever, one task per connection. A failed accept is logged and
/// the loop keeps going; a failed connection never reaches the listener.
#[instrument(skip(listener, proxy, cfg))]
pub(crate) async fn accept_loop<U: Upstream>(
    listener: TcpListener,
    proxy: Arc<CacheAside<U>>,
    cfg: Arc<ProxyConfig>,
) -> anyhow::Result<()> {
    info!(
        target: "stash::master",
        "accept_loop started for listening socket"
    );

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    target: "stash::master",
                    error = ?e,
                    "Failed to accept connection"
                );
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };

        debug!(
            target: "stash::master",
            client_addr = %addr,
            "Connection accepted"
        );

        let proxy = proxy.clone();
        let cfg = cfg.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, proxy, cfg).await {
                debug!(
                    target: "stash::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Connection ended with an error"
                );
            } else {
                debug!(
                    target: "stash::worker",
                    client_addr = %addr,
                    "Connection handled successfully"
                );
            }
        });
    }
}
