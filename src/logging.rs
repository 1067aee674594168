// Logging setup

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log filter
pub const LOG_ENV: &str = "AUDIOPARAMS_LOG";

/// Build the filter: `AUDIOPARAMS_LOG` wins, then `level`, then "warn"
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the stderr subscriber. Returns false when one was already
/// installed, in which case the existing subscriber is kept.
pub fn init(level: &str) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter_for(level))
        .with_target(false)
        .try_init();
    if let Err(e) = &installed {
        tracing::debug!("Keeping existing tracing subscriber: {}", e);
    }
    installed.is_ok()
}
