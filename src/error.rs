//! Application-wide error types.
//!
//! SDK failures live in [`ClientError`](crate::sdk::ClientError); this enum
//! wraps them alongside the bootstrap concerns (config, logger, session).

use thiserror::Error;

use crate::sdk::ClientError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
