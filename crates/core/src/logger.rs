use tracing::{Level, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when none is given or the given one is not recognised.
pub const DEFAULT_LOG_LEVEL: Level = Level::WARN;

pub fn parse_log_level(log_level: &str) -> Option<Level> {
    match log_level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Installs the global subscriber. Diagnostics go to stderr so they never mix
/// with the probe transcript; `RUST_LOG` takes precedence over `log_level`.
pub fn init_logger(log_level: &str) {
    let level = parse_log_level(log_level);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL).to_string())
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if level.is_none() {
        warn!(
            "Invalid log level '{}', defaulting to '{}'",
            log_level,
            DEFAULT_LOG_LEVEL.as_str().to_lowercase()
        );
    }
}
