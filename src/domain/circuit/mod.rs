//! Circuit breaker domain: states, configuration, the pure state core,
//! statistics and the guarded-call error type.

mod config;
mod machine;
mod errors;
mod state;
mod stats;

pub use self::config::CircuitBreakerConfig;
pub use machine::{Admission, CircuitCore, FailureKind, RECENT_EVENT_CAPACITY, RECENT_RATE_WINDOW};
pub use errors::CircuitBreakerError;
pub use state::CircuitState;
pub use stats::CircuitBreakerStats;
