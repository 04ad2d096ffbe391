//! CircuitBreaker - guards calls to one named dependency.
//!
//! ## States
//!
//! - **Closed**: normal operation, calls flow through
//! - **Open**: too many failures, calls rejected immediately
//! - **Half-Open**: probing whether the dependency recovered
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open --[recovery_timeout elapsed, next call]--> Half-Open
//! Half-Open --[success_threshold successes]--> Closed
//! Half-Open --[any failure]--> Open
//! ```
//!
//! The operation runs outside the breaker's lock, bounded by the configured
//! call timeout. A timed-out operation future is dropped.

use std::future::Future;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::domain::circuit::{
    Admission, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitCore,
    CircuitState, FailureKind,
};
use crate::domain::foundation::lock;

/// A circuit breaker for one external dependency.
///
/// # Example
///
/// ```ignore
/// let config = CircuitBreakerConfig::default().with_call_timeout(Duration::from_secs(10));
/// let breaker = CircuitBreaker::new("payments", config);
///
/// match breaker.call(async { client.charge(&order).await }).await {
///     Ok(receipt) => Ok(receipt),
///     Err(CircuitBreakerError::Open { retry_after, .. }) => Err(Unavailable(retry_after)),
///     Err(other) => Err(other.into()),
/// }
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    core: Mutex<CircuitCore>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            core: Mutex::new(CircuitCore::new(config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        lock(&self.core).config().clone()
    }

    /// Current state. An expired open circuit still reports `Open` until
    /// the next call attempt moves it to `HalfOpen`.
    pub fn state(&self) -> CircuitState {
        lock(&self.core).state()
    }

    /// Run `operation` through the breaker, counting every error as a failure.
    pub async fn call<T, E, F>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.call_classified(operation, |_| true).await
    }

    /// Run `operation` through the breaker.
    ///
    /// Errors for which `is_countable` returns `false` are handed back as
    /// `CircuitBreakerError::Inner` without affecting breaker state, so
    /// business-level failures (validation, not-found) never trip it.
    pub async fn call_classified<T, E, F, C>(
        &self,
        operation: F,
        is_countable: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
        C: FnOnce(&E) -> bool,
    {
        let call_timeout = self.acquire()?;

        match tokio::time::timeout(call_timeout, operation).await {
            Ok(Ok(value)) => {
                self.on_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                if is_countable(&e) {
                    self.on_failure(FailureKind::Error);
                }
                Err(CircuitBreakerError::Inner(e))
            }
            Err(_) => {
                self.on_failure(FailureKind::Timeout);
                tracing::warn!(
                    breaker = %self.name,
                    timeout_ms = call_timeout.as_millis() as u64,
                    "Call timed out"
                );
                Err(CircuitBreakerError::Timeout {
                    name: self.name.clone(),
                    timeout: call_timeout,
                })
            }
        }
    }

    /// Force the breaker closed and clear all statistics.
    pub fn reset(&self) {
        lock(&self.core).reset();
        tracing::info!(breaker = %self.name, "Circuit breaker reset");
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        lock(&self.core).stats(&self.name, Instant::now())
    }

    fn acquire<E>(&self) -> Result<std::time::Duration, CircuitBreakerError<E>> {
        let mut core = lock(&self.core);
        let before = core.state();

        match core.try_acquire(Instant::now()) {
            Admission::Rejected { retry_after } => {
                tracing::debug!(
                    breaker = %self.name,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Call rejected, circuit open"
                );
                Err(CircuitBreakerError::Open {
                    name: self.name.clone(),
                    retry_after,
                })
            }
            Admission::Admitted(state) => {
                if before != state {
                    tracing::info!(breaker = %self.name, from = %before, to = %state, "Circuit state changed");
                }
                Ok(core.config().call_timeout)
            }
        }
    }

    fn on_success(&self) {
        let changed = lock(&self.core).record_success(Instant::now());
        if let Some(state) = changed {
            tracing::info!(breaker = %self.name, to = %state, "Circuit recovered");
        }
    }

    fn on_failure(&self, kind: FailureKind) {
        let (changed, failures) = {
            let mut core = lock(&self.core);
            let changed = core.record_failure(Instant::now(), kind);
            (changed, core.consecutive_failures())
        };
        if let Some(state) = changed {
            tracing::warn!(
                breaker = %self.name,
                to = %state,
                consecutive_failures = failures,
                "Circuit opened"
            );
        }
    }
}
