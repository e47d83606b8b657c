//! Proxy configuration: defaults, `stash.conf`, `STASH_*` environment and
//! command-line flags, in that order of precedence (last wins).

mod cache;
mod cli;
mod log;
mod server;
mod stash;
mod upstream;
mod validation;

pub use cache::CacheConfig;
pub use cli::Cli;
pub use log::LogConfig;
pub use server::ServerConfig;
pub use stash::ProxyConfig;
pub use upstream::UpstreamConfig;
pub use validation::ConfigReport;

pub const DEFAULT_CONFIG_FILE: &str = "stash.conf";
