//! Circuit breaker configuration.

use std::time::Duration;

use crate::domain::foundation::ValidationError;

/// Configuration for circuit breaker behavior.
///
/// Immutable once a breaker has been built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    ///
    /// Default: 5 failures
    pub failure_threshold: u32,

    /// Time to wait in `Open` before a call may probe the dependency.
    ///
    /// Default: 60 seconds
    pub recovery_timeout: Duration,

    /// Consecutive successes in `HalfOpen` needed to close the circuit.
    ///
    /// Default: 3 successes
    pub success_threshold: u32,

    /// Deadline for a single guarded call. Exceeding it counts as a failure.
    ///
    /// Default: 30 seconds
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 3,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Check thresholds are at least 1 and durations are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.failure_threshold == 0 {
            return Err(ValidationError::out_of_range(
                "failure_threshold",
                1.0,
                u32::MAX as f64,
                0.0,
            ));
        }
        if self.success_threshold == 0 {
            return Err(ValidationError::out_of_range(
                "success_threshold",
                1.0,
                u32::MAX as f64,
                0.0,
            ));
        }
        if self.recovery_timeout.is_zero() {
            return Err(ValidationError::invalid_format(
                "recovery_timeout",
                "must be greater than zero",
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(ValidationError::invalid_format(
                "call_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
