//! Logging initialisation via tracing-subscriber.
//!
//! The resolved `log_level` (config file, then `HABITAT_LOG_LEVEL`) sets
//! the global level. `RUST_LOG`, when set, only adds per-target directives
//! on top of it, e.g. `RUST_LOG=habitat_client::sdk=trace` to dump
//! response bodies without turning up everything else.

use std::env;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber, writing to stderr. Call once at startup,
/// after config is resolved.
pub fn init(level: &str) -> Result<(), AppError> {
    let filter = build_filter(level, env::var("RUST_LOG").ok().as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// `level` as the default directive plus any `RUST_LOG` target directives.
pub fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter, AppError> {
    let default = parse_level(level)?;
    let filter = EnvFilter::builder()
        .parse(rust_log.unwrap_or_default())
        .map_err(|e| AppError::Logger(format!("invalid RUST_LOG directives: {e}")))?;
    Ok(filter.add_directive(default.into()))
}

pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
