use env_logger::{Builder, Env};

/// Initialize logging with env_logger.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to the provided level.
pub fn init(log_level: &str) {
    Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .format_target(false)
        .init();
}
