use clap::Parser;
use stash_config::{Cli, ProxyConfig};
use stash_core::Master;
use tracing::error;
use utils::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = ProxyConfig::load_or_default(&cli);

    init_tracing(cfg.log().level());
    cfg.print();

    if let Err(e) = Master::new(cfg).run().await {
        error!(target: "stash::master", error = ?e, "Proxy stopped");
        return Err(e);
    }

    Ok(())
}
