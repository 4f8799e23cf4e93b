//! Logging utilities

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the fallback log level
pub const LOG_LEVEL_ENV: &str = "LSA_LOG_LEVEL";

/// Build the level filter: `RUST_LOG` wins, then `LSA_LOG_LEVEL`, then `info`
pub fn env_filter() -> EnvFilter {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global logging system
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging() {
    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
