//! Log subscriber setup.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;
use crate::error::{DbAssertError, Result};

/// Map a verbosity name to a level. Unknown names fall back to INFO.
pub fn parse_level(verbosity: &str) -> Level {
    match verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install a global `tracing` subscriber writing text or JSON to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init(verbosity: &str, format: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(parse_level(verbosity))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| DbAssertError::Config(format!("logging already initialized: {}", e)))
}

/// Install a subscriber from the `logging` section of the configuration.
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    init(&config.verbosity, &config.format)
}
