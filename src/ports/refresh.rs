//! Refresh-ahead callback port.
//!
//! The cache knows when a value is about to expire but not how to recompute
//! it. It reports the key here and the owner of the compute function decides
//! what to do.

use std::time::Duration;

/// Receives refresh-ahead signals from the cache.
///
/// Called on the reader's task while no cache lock is held; implementations
/// should hand work off rather than recompute inline.
pub trait RefreshAheadHandler: Send + Sync {
    fn on_refresh_due(&self, key: &str, remaining_ttl: Duration);
}

/// Handler for caches nobody refreshes; entries simply expire.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRefreshHandler;

impl RefreshAheadHandler for NoOpRefreshHandler {
    fn on_refresh_due(&self, _key: &str, _remaining_ttl: Duration) {}
}
