//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Choose between human-readable and JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - JSON format for production, pretty format for development

use tracing_subscriber::EnvFilter;

/// Build the filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("keytiles_proxy={level},tower_http={level}"))
    })
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(level: &str, json: bool) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter(level));

    let result = if json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
