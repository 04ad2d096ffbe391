//! Domain layer containing the resilience state machines and value types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, validation errors, state machine trait)
//! - `circuit` - Circuit breaker states, configuration, pure state core and stats
//! - `cache` - Cache entries, invalidation patterns and stats
//! - `health` - Component and overall health verdicts, snapshots
//! - `rate_limit` - Sliding window admission log

pub mod cache;
pub mod circuit;
pub mod foundation;
pub mod health;
pub mod rate_limit;
