//! Unified error types for Relaygate Core.

use thiserror::Error;

use crate::modules::repository::RepositoryError;
use crate::proxy::rate_limit::CounterError;
use crate::proxy::recovery::ProbeError;

/// Main error type for core operations that cross component boundaries.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] relaygate_types::ConfigError),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Counter store could not serve an increment.
    #[error("Counter store error: {0}")]
    Store(#[from] CounterError),

    /// Account repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Connectivity probe failed.
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;
