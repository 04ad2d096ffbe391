//! Adapters - Implementations of port interfaces.
//!
//! - `cache` - remote cache tiers (Redis, in-memory, no-op) and refresh-ahead handlers
//! - `rate_limiter` - in-process sliding-window rate limiter

pub mod cache;
pub mod rate_limiter;
