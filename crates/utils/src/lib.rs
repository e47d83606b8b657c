use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG` wins; otherwise `level` applies
/// to everything.
pub fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false),
        )
        .init();
}

fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => level,
        _ => "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::default_directives;

    #[test]
    fn known_levels_are_used_as_is() {
        assert_eq!(default_directives("INFO"), "info");
        assert_eq!(default_directives("debug"), "debug");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(default_directives("loud"), "info");
        assert_eq!(default_directives("warn"), "warn");
    }
}
