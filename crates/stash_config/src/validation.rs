use std::net::IpAddr;

use http::Uri;

use crate::ProxyConfig;

/// Same ceiling as the `--ttl` flag.
const MAX_TTL_MINUTES: u64 = u32::MAX as u64;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation output for a loaded proxy configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the collected error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a proxy configuration and return a report of issues.
pub fn validate(cfg: &ProxyConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_server(cfg, &mut report);
    validate_upstream(cfg, &mut report);
    validate_cache(cfg, &mut report);
    validate_log(cfg, &mut report);

    report
}

fn validate_server(cfg: &ProxyConfig, report: &mut ConfigReport) {
    if cfg.server.host.parse::<IpAddr>().is_err() {
        report.error(format!(
            "server.host '{host}' is not an IP address",
            host = cfg.server.host
        ));
    }
    if cfg.server.port == 0 {
        report.warn("server.port is 0; the OS will pick a random port");
    }
}

fn validate_upstream(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let url = cfg.upstream.url.trim();
    if url.is_empty() {
        report.error("upstream.url is empty");
    } else {
        match url.parse::<Uri>() {
            Ok(uri) => {
                if uri.scheme_str() != Some("http") {
                    report.error(format!(
                        "upstream.url '{url}' must start with http:// (TLS upstreams are not supported)"
                    ));
                }
                if uri.host().is_none() {
                    report.error(format!("upstream.url '{url}' has no host"));
                }
                if uri.query().is_some() {
                    report.warn(format!(
                        "upstream.url '{url}' has a query string; it is dropped when forwarding"
                    ));
                }
            }
            Err(e) => report.error(format!("upstream.url '{url}' is not a valid URL: {e}")),
        }
    }

    if cfg.upstream.timeout_secs == 0 {
        report.error("upstream.timeout_secs must be greater than 0");
    }
}

fn validate_cache(cfg: &ProxyConfig, report: &mut ConfigReport) {
    if cfg.cache.ttl_minutes > MAX_TTL_MINUTES {
        report.error(format!(
            "cache.ttl_minutes {} is too large (max {MAX_TTL_MINUTES})",
            cfg.cache.ttl_minutes
        ));
    }
    if cfg.cache.ttl_minutes == 0 {
        report.warn("cache.ttl_minutes is 0; responses will not be cached");
        if cfg.cache.stats_endpoint {
            report.warn("cache.stats_endpoint is enabled but caching is disabled");
        }
    }
}

fn validate_log(cfg: &ProxyConfig, report: &mut ConfigReport) {
    let level = cfg.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        report.warn(format!(
            "log.level '{level}' is not one of {LOG_LEVELS:?}; falling back to 'info'",
            level = cfg.log.level
        ));
    }
}
