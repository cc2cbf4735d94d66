//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DIALOGUE_ENGINE` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a working
//! in-memory engine.
//!
//! # Example
//!
//! ```no_run
//! use dialogue_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! config.logging.init_tracing();
//!
//! let limits = config.engine.limits();
//! ```

mod engine;
mod error;
mod logging;
mod runtime;
mod storage;

pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use runtime::RuntimeConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

use crate::domain::dialogue::ResponseTemplates;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Turn limits and collaborator timeouts
    #[serde(default)]
    pub engine: EngineConfig,

    /// Session actors and worker pool
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Checkpoint backend
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Overrides for user-facing text
    #[serde(default)]
    pub responses: ResponseTemplates,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DIALOGUE_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DIALOGUE_ENGINE__ENGINE__MAX_STACK_DEPTH=6` -> `engine.max_stack_depth = 6`
    /// - `DIALOGUE_ENGINE__STORAGE__BACKEND=file` -> `storage.backend = file`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DIALOGUE_ENGINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.runtime.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
