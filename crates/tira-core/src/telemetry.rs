//! Centralised tracing initialisation for the admin binary.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting. Subsequent
//! calls are ignored (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON log lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// Initialise tracing from the `[logging]` config section.
///
/// An unparseable level falls back to `info`.
pub fn init_from_config(logging: &LoggingConfig) {
    init_tracing(logging.json, logging.level())
}
