//! Application layer - the components callers hold.
//!
//! Each wraps pure domain state with locking, timeouts and logging, and
//! reaches external systems only through ports.

mod breaker_registry;
mod circuit_breaker;
mod context;
mod health_aggregator;
mod multi_tier_cache;
mod protected_call;

pub use breaker_registry::{BreakerHealthSummary, CircuitBreakerRegistry};
pub use circuit_breaker::CircuitBreaker;
pub use context::{InitError, ResilienceContext};
pub use health_aggregator::{HealthAggregator, HealthMonitor};
pub use multi_tier_cache::MultiTierCache;
pub use protected_call::{ProtectedCall, ProtectedCallError};
