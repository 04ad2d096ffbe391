//! Health monitoring configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Seconds between background health checks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Bound on a single component's health or metrics call
    #[serde(default = "default_check_timeout")]
    pub check_timeout_ms: u64,
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout("health.interval_secs"));
        }
        if self.check_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("health.check_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            check_timeout_ms: default_check_timeout(),
        }
    }
}

fn default_interval() -> u64 {
    30
}

fn default_check_timeout() -> u64 {
    2_000
}
