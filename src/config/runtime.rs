//! Session runtime configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session actor and worker pool settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Turns that may execute at the same time across all sessions
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Messages queued per session while a turn is in flight
    #[serde(default = "default_session_queue_capacity")]
    pub session_queue_capacity: usize,

    /// Seconds an idle session actor lives before it is retired
    #[serde(default = "default_session_idle_timeout")]
    pub session_idle_timeout_secs: u64,
}

impl RuntimeConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }

    /// Validate runtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_pool_size == 0 || self.worker_pool_size > 1024 {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.session_queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.session_idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session_idle_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            session_queue_capacity: default_session_queue_capacity(),
            session_idle_timeout_secs: default_session_idle_timeout(),
        }
    }
}

fn default_worker_pool_size() -> usize {
    16
}

fn default_session_queue_capacity() -> usize {
    8
}

fn default_session_idle_timeout() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.worker_pool_size, 16);
        assert_eq!(config.session_queue_capacity, 8);
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_pool() {
        let config = RuntimeConfig {
            worker_pool_size: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));
    }

    #[test]
    fn test_rejects_zero_queue() {
        let config = RuntimeConfig {
            session_queue_capacity: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueueCapacity));
    }
}
