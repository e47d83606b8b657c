use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use crate::validation::{ConfigReport, validate};
use crate::{CacheConfig, Cli, LogConfig, ServerConfig, UpstreamConfig};

// =======================================================
// PROXY CONFIG: main config
// =======================================================
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ProxyConfig {
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Builds the config from `cli.config` (INI), `STASH_*` variables
    /// (`STASH_UPSTREAM__URL=...`) and the flags in `cli`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::new(&cli.config, FileFormat::Ini).required(false))
            .add_source(
                Environment::with_prefix("STASH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(apply_cli_overrides(builder, cli)?)
    }

    /// Same layering as [`ProxyConfig::load`] with an in-memory INI document
    /// instead of a file and no environment.
    pub fn from_ini_str(ini: &str, cli: &Cli) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(ini, FileFormat::Ini));
        Self::build(apply_cli_overrides(builder, cli)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Loads and validates; anything unusable falls back to the built-in
    /// defaults after printing why.
    pub fn load_or_default(cli: &Cli) -> Self {
        match Self::load(cli) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("Invalid config in '{}':", cli.config);
                    eprintln!("{}", report.format());
                    eprintln!("Using default config (in-memory)...");
                    ProxyConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        eprintln!("Config warnings in '{}':", cli.config);
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("Error reading config '{}': {e}", cli.config);
                eprintln!("Using default config (in-memory)...");
                ProxyConfig::default()
            }
        }
    }

    pub fn print(&self) {
        println!("================ STASH CONFIG ================");
        println!("\n[server]");
        println!("  host                 = {}", self.server.host);
        println!("  port                 = {}", self.server.port);
        println!("\n[upstream]");
        println!("  url                  = {}", self.upstream.url);
        println!("  timeout_secs         = {}", self.upstream.timeout_secs);
        println!("\n[cache]");
        println!("  ttl_minutes          = {}", self.cache.ttl_minutes);
        println!("  stats_endpoint       = {}", self.cache.stats_endpoint);
        println!("\n[log]");
        println!("  level                = {}", self.log.level);
        println!("==============================================");
    }
}

fn apply_cli_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Some(host) = &cli.host {
        builder = builder.set_override("server.host", host.as_str())?;
    }
    if let Some(port) = cli.port {
        builder = builder.set_override("server.port", i64::from(port))?;
    }
    if let Some(url) = &cli.url {
        builder = builder.set_override("upstream.url", url.as_str())?;
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.set_override("upstream.timeout_secs", i64::from(timeout))?;
    }
    if let Some(ttl) = cli.ttl {
        builder = builder.set_override("cache.ttl_minutes", i64::from(ttl))?;
    }
    if cli.stats {
        builder = builder.set_override("cache.stats_endpoint", true)?;
    }
    if let Some(level) = &cli.log_level {
        builder = builder.set_override("log.level", level.as_str())?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::ProxyConfig;
    use crate::Cli;
    use std::time::Duration;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ProxyConfig::default();
        assert_eq!(cfg.server.port, 9999);
        assert_eq!(cfg.server.listen_addr(), "0.0.0.0:9999");
        assert_eq!(cfg.upstream.url, "http://httpbin.org");
        assert_eq!(cfg.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.cache.ttl(), Some(Duration::from_secs(5 * 60)));
        assert!(!cfg.cache.stats_endpoint);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn ini_sections_override_defaults() {
        let ini = "[server]\nport = 8080\n\n[upstream]\nurl = http://127.0.0.1:3000\ntimeout_secs = 3\n\n[cache]\nttl_minutes = 1\n";
        let cfg = ProxyConfig::from_ini_str(ini, &Cli::default()).expect("valid ini");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.upstream.url, "http://127.0.0.1:3000");
        assert_eq!(cfg.upstream.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.cache.ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn cli_flags_win_over_file() {
        let ini = "[server]\nport = 8080\n\n[cache]\nttl_minutes = 1\n";
        let cli = Cli {
            port: Some(7000),
            ttl: Some(0),
            stats: true,
            url: Some("http://origin.internal".into()),
            ..Cli::default()
        };
        let cfg = ProxyConfig::from_ini_str(ini, &cli).expect("valid ini");
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.upstream.url, "http://origin.internal");
        assert_eq!(cfg.cache.ttl(), None);
        assert!(cfg.cache.stats_endpoint);
    }
}
