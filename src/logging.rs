//! Logger installation driven by the `LOG_LEVEL` configuration value.

use crate::config::AppConfig;
use log::LevelFilter;

/// Map a `LOG_LEVEL` value to a filter. Unknown values mean `info`.
pub fn level_filter(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Install an `env_logger` logger with `level` as the default filter.
///
/// `RUST_LOG` still takes precedence when set. Returns `false` if a logger was already
/// installed, which is not an error.
pub fn init_logging(level: &str) -> bool {
    let filter = level_filter(level);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter.to_string().to_lowercase()),
    )
    .try_init()
    .is_ok()
}

/// [`init_logging`] with the resolved configuration's level.
pub fn init_from_config(config: &AppConfig) -> bool {
    init_logging(&config.log_level)
}
