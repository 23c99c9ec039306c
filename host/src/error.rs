//! Unified error handling for the host.

use crate::config::ConfigError;
use std::time::Duration;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] tether_engine::Error),

    #[error("No update within {0:?}")]
    Timeout(Duration),
}

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, AppError>;
