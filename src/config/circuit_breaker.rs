//! Circuit breaker configuration

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::circuit::CircuitBreakerConfig;

/// Default breaker settings plus per-dependency overrides.
///
/// Overrides are keyed by breaker name, e.g.
/// `RESILIENCE__CIRCUIT_BREAKER__BREAKERS__PAYMENTS__FAILURE_THRESHOLD=2`.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout_secs: u64,

    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,

    /// Breakers created at startup, with any fields they override
    #[serde(default)]
    pub breakers: BTreeMap<String, BreakerOverride>,
}

/// Fields a named breaker may override; unset fields use the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreakerOverride {
    pub failure_threshold: Option<u32>,
    pub recovery_timeout_secs: Option<u64>,
    pub success_threshold: Option<u32>,
    pub call_timeout_ms: Option<u64>,
}

impl CircuitBreakerSettings {
    /// Config used for breakers without an override.
    pub fn default_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: Duration::from_secs(self.recovery_timeout_secs),
            success_threshold: self.success_threshold,
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }

    /// Config for a named breaker, applying its override if present.
    pub fn config_for(&self, name: &str) -> CircuitBreakerConfig {
        let mut config = self.default_config();
        if let Some(o) = self.breakers.get(name) {
            if let Some(v) = o.failure_threshold {
                config.failure_threshold = v;
            }
            if let Some(v) = o.recovery_timeout_secs {
                config.recovery_timeout = Duration::from_secs(v);
            }
            if let Some(v) = o.success_threshold {
                config.success_threshold = v;
            }
            if let Some(v) = o.call_timeout_ms {
                config.call_timeout = Duration::from_millis(v);
            }
        }
        config
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let check = |name: &str, config: CircuitBreakerConfig| {
            config
                .validate()
                .map_err(|e| ValidationError::InvalidCircuitBreaker {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
        };
        check("default", self.default_config())?;
        for name in self.breakers.keys() {
            check(name, self.config_for(name))?;
        }
        Ok(())
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout(),
            success_threshold: default_success_threshold(),
            call_timeout_ms: default_call_timeout(),
            breakers: BTreeMap::new(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> u64 {
    60
}

fn default_success_threshold() -> u32 {
    3
}

fn default_call_timeout() -> u64 {
    30_000
}
