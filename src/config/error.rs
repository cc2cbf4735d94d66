//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Engine limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("Timeout '{0}' must be between 1ms and 10 minutes")]
    InvalidTimeout(&'static str),

    #[error("Worker pool size must be between 1 and 1024")]
    InvalidPoolSize,

    #[error("Session queue capacity must be greater than zero")]
    InvalidQueueCapacity,

    #[error("Unknown log level filter: {0}")]
    InvalidLogLevel(String),
}
