//! Point-in-time circuit breaker statistics.

use serde::Serialize;

use super::CircuitState;
use crate::domain::foundation::Timestamp;

/// Statistics about a circuit breaker, safe to serialize for `/metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,

    /// Calls that reached the dependency.
    pub total_calls: u64,
    pub successful_calls: u64,
    /// Failed calls, timeouts included.
    pub failed_calls: u64,
    pub timeout_calls: u64,
    /// Calls rejected while the circuit was open.
    pub rejected_calls: u64,
    /// Times the circuit has opened.
    pub circuit_open_count: u64,

    pub consecutive_failures: u32,
    pub consecutive_successes: u32,

    pub last_success_at: Option<Timestamp>,
    pub last_failure_at: Option<Timestamp>,

    /// successful / total, 0 when nothing ran yet.
    pub success_rate: f64,
    /// Failure share of the recent events inside the last five minutes.
    pub recent_failure_rate: f64,
    /// Zero unless the circuit is open.
    pub time_until_next_attempt_ms: u64,
}
