//! Rate limiter adapters.
//!
//! - `SlidingWindowRateLimiter` - in-process sliding window log with idle-key eviction
//!
//! ## Usage
//!
//! ```ignore
//! use resilience_core::adapters::rate_limiter::{RateLimitConfig, SlidingWindowRateLimiter};
//!
//! let limiter = SlidingWindowRateLimiter::new(RateLimitConfig::per_minute(60));
//! if !limiter.allow(&RateLimitKey::ip(client_ip)).await {
//!     // 429 with Retry-After from limiter.reset_time(..)
//! }
//! ```

mod config;
mod in_memory;

pub use config::RateLimitConfig;
pub use in_memory::SlidingWindowRateLimiter;
