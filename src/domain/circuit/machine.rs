//! Pure circuit breaker state machine.
//!
//! `CircuitCore` holds every piece of mutable breaker state and takes the
//! current instant as an argument, so all transitions can be exercised
//! without running an operation. The async wrapper serialises access to it
//! behind one lock per breaker.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use super::{CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
use crate::domain::foundation::{deadline_after, saturating_millis, StateMachine, Timestamp};

/// Bound on each recent-event window.
pub const RECENT_EVENT_CAPACITY: usize = 100;

/// Span used for the recent failure rate.
pub const RECENT_RATE_WINDOW: Duration = Duration::from_secs(300);

/// Outcome of asking the core whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may run; carries the state it runs under.
    Admitted(CircuitState),
    /// The circuit is open; carries the time left until the next attempt.
    Rejected { retry_after: Duration },
}

/// How a failed call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Error,
    Timeout,
}

#[derive(Debug, Default, Clone)]
struct CallCounters {
    total: u64,
    successes: u64,
    failures: u64,
    timeouts: u64,
    rejected: u64,
    times_opened: u64,
    last_success_at: Option<Timestamp>,
    last_failure_at: Option<Timestamp>,
}

/// All mutable state of one circuit breaker.
#[derive(Debug)]
pub struct CircuitCore {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
    next_attempt_at: Option<Instant>,
    counters: CallCounters,
    recent_failures: VecDeque<Instant>,
    recent_successes: VecDeque<Instant>,
}

impl CircuitCore {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
            next_attempt_at: None,
            counters: CallCounters::default(),
            recent_failures: VecDeque::with_capacity(RECENT_EVENT_CAPACITY),
            recent_successes: VecDeque::with_capacity(RECENT_EVENT_CAPACITY),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    pub fn next_attempt_at(&self) -> Option<Instant> {
        self.next_attempt_at
    }

    /// Decide whether a call may run at `now`.
    ///
    /// An open circuit past its `next_attempt_at` moves to `HalfOpen` here,
    /// before the call executes.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        if self.state != CircuitState::Open {
            return Admission::Admitted(self.state);
        }

        let next_attempt_at = self.next_attempt_at.unwrap_or(now);
        if now < next_attempt_at {
            self.counters.rejected += 1;
            return Admission::Rejected {
                retry_after: next_attempt_at - now,
            };
        }

        self.transition(CircuitState::HalfOpen);
        self.consecutive_successes = 0;
        self.next_attempt_at = None;
        Admission::Admitted(CircuitState::HalfOpen)
    }

    /// Record a successful call. Returns the new state if it changed.
    pub fn record_success(&mut self, now: Instant) -> Option<CircuitState> {
        self.counters.total += 1;
        self.counters.successes += 1;
        self.counters.last_success_at = Some(Timestamp::now());
        push_bounded(&mut self.recent_successes, now);

        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                self.consecutive_successes += 1;
                if self.consecutive_successes >= self.config.success_threshold {
                    self.close();
                    Some(CircuitState::Closed)
                } else {
                    None
                }
            }
            // A call admitted before a concurrent failure opened the circuit.
            CircuitState::Open => None,
        }
    }

    /// Record a countable failure. Returns the new state if it changed.
    pub fn record_failure(&mut self, now: Instant, kind: FailureKind) -> Option<CircuitState> {
        self.counters.total += 1;
        self.counters.failures += 1;
        if kind == FailureKind::Timeout {
            self.counters.timeouts += 1;
        }
        self.counters.last_failure_at = Some(Timestamp::now());
        push_bounded(&mut self.recent_failures, now);

        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        match self.state {
            CircuitState::Closed if self.consecutive_failures >= self.config.failure_threshold => {
                self.open(now);
                Some(CircuitState::Open)
            }
            CircuitState::HalfOpen => {
                self.open(now);
                Some(CircuitState::Open)
            }
            _ => None,
        }
    }

    /// Force `Closed` and forget all counters and timestamps.
    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.opened_at = None;
        self.next_attempt_at = None;
        self.counters = CallCounters::default();
        self.recent_failures.clear();
        self.recent_successes.clear();
    }

    pub fn stats(&self, name: &str, now: Instant) -> CircuitBreakerStats {
        let counters = &self.counters;
        let success_rate = if counters.total == 0 {
            0.0
        } else {
            counters.successes as f64 / counters.total as f64
        };

        let recent_failures = count_within(&self.recent_failures, now, RECENT_RATE_WINDOW);
        let recent_successes = count_within(&self.recent_successes, now, RECENT_RATE_WINDOW);
        let recent_total = recent_failures + recent_successes;
        let recent_failure_rate = if recent_total == 0 {
            0.0
        } else {
            recent_failures as f64 / recent_total as f64
        };

        let time_until_next_attempt = match (self.state, self.next_attempt_at) {
            (CircuitState::Open, Some(at)) => at.saturating_duration_since(now),
            _ => Duration::ZERO,
        };

        CircuitBreakerStats {
            name: name.to_string(),
            state: self.state,
            total_calls: counters.total,
            successful_calls: counters.successes,
            failed_calls: counters.failures,
            timeout_calls: counters.timeouts,
            rejected_calls: counters.rejected,
            circuit_open_count: counters.times_opened,
            consecutive_failures: self.consecutive_failures,
            consecutive_successes: self.consecutive_successes,
            last_success_at: counters.last_success_at,
            last_failure_at: counters.last_failure_at,
            success_rate,
            recent_failure_rate,
            time_until_next_attempt_ms: saturating_millis(time_until_next_attempt),
        }
    }

    fn open(&mut self, now: Instant) {
        self.transition(CircuitState::Open);
        self.opened_at = Some(now);
        self.next_attempt_at = Some(deadline_after(now, self.config.recovery_timeout));
        self.consecutive_successes = 0;
        self.counters.times_opened += 1;
    }

    fn close(&mut self) {
        self.transition(CircuitState::Closed);
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.opened_at = None;
        self.next_attempt_at = None;
    }

    fn transition(&mut self, target: CircuitState) {
        if let Ok(next) = self.state.transition_to(target) {
            self.state = next;
        }
    }
}

fn push_bounded(window: &mut VecDeque<Instant>, at: Instant) {
    if window.len() == RECENT_EVENT_CAPACITY {
        window.pop_front();
    }
    window.push_back(at);
}

fn count_within(window: &VecDeque<Instant>, now: Instant, span: Duration) -> usize {
    window
        .iter()
        .filter(|at| now.saturating_duration_since(**at) <= span)
        .count()
}
