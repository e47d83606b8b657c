use clap::Parser;

use crate::DEFAULT_CONFIG_FILE;

/// Command-line flags. Every flag is optional and only overrides what the
/// config file and environment already set.
#[derive(Debug, Default, Parser)]
#[command(name = "stash", version, about = "Caching HTTP reverse proxy")]
pub struct Cli {
    /// Config file (INI). Missing file is fine.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Address to listen on.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to serve the proxy on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upstream URL to forward to.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Upstream client timeout in seconds.
    #[arg(short, long)]
    pub timeout: Option<u32>,

    /// Cache TTL in minutes (0 disables caching).
    #[arg(long)]
    pub ttl: Option<u32>,

    /// Expose cache statistics on /_stash/cache (loopback clients only).
    #[arg(long)]
    pub stats: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long)]
    pub log_level: Option<String>,
}
