//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the resilience core and the outside world. Adapters implement these ports.
//!
//! - `RemoteCacheStore` - Shared remote cache tier (Redis in production)
//! - `RateLimiter` - Per-key request admission control
//! - `HealthCheckable` - Capability every health-monitored component exposes
//! - `RefreshAheadHandler` - Callback for cache entries nearing expiry

mod cache_store;
mod health_check;
mod rate_limiter;
mod refresh;

pub use cache_store::{CacheStoreError, RemoteCacheStore, RemoteValue};
pub use health_check::{HealthCheckError, HealthCheckable};
pub use rate_limiter::{
    RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitScope, RateLimitStatus, RateLimiter,
};
pub use refresh::{NoOpRefreshHandler, RefreshAheadHandler};
