//! Cache adapters.
//!
//! ## Remote tiers
//!
//! - `RedisCacheStore` - Redis-backed, shared between processes
//! - `InMemoryCacheStore` - in-process stand-in for tests
//! - `NoOpCacheStore` - explicit "no remote tier"
//!
//! ## Refresh-ahead
//!
//! - `ChannelRefreshHandler` - forwards due keys to an mpsc channel

mod in_memory;
mod noop;
mod redis;
mod refresh;

pub use in_memory::InMemoryCacheStore;
pub use noop::NoOpCacheStore;
pub use redis::RedisCacheStore;
pub use refresh::{ChannelRefreshHandler, RefreshRequest};
