//! Errors returned by a guarded call.

use std::time::Duration;
use thiserror::Error;

/// Error returned by `CircuitBreaker::call`.
///
/// `Open` and `Timeout` originate in the breaker itself; `Inner` carries the
/// operation's own error untouched so business failures stay visible.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker rejected the call without attempting it.
    #[error("circuit '{name}' is open, retry after {retry_after:?}")]
    Open { name: String, retry_after: Duration },

    /// The operation exceeded the breaker's call timeout.
    #[error("call through circuit '{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// The operation itself failed.
    #[error("{0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitBreakerError::Open { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CircuitBreakerError::Timeout { .. })
    }

    /// How long the caller should wait before retrying, when known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CircuitBreakerError::Open { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns the operation's own error, if that is what failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_reports_retry_after() {
        let err: CircuitBreakerError<String> = CircuitBreakerError::Open {
            name: "payments".to_string(),
            retry_after: Duration::from_secs(5),
        };
        assert!(err.is_open());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert!(err.to_string().contains("payments"));
    }

    #[test]
    fn inner_error_displays_operation_message() {
        let err = CircuitBreakerError::Inner("upstream returned 503".to_string());
        assert_eq!(err.to_string(), "upstream returned 503");
        assert_eq!(err.into_inner().as_deref(), Some("upstream returned 503"));
    }
}
