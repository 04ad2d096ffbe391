//! Rate limit configuration types.
//!
//! One quota per window for every key. Deserialized straight from the
//! `rate_limit` config section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window, per key.
    pub requests_per_minute: u32,
    /// Window length in seconds.
    pub window_secs: u32,
    /// Keys with no admissions in the window and untouched this long are dropped.
    pub idle_key_ttl_secs: u64,
    /// Upper bound on tracked keys.
    pub max_keys: usize,
    /// How often the background sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            window_secs: 60,
            idle_key_ttl_secs: 300,
            max_keys: 100_000,
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Config with a single quota and everything else defaulted.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            ..Self::default()
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.window_secs))
    }

    pub fn idle_key_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_key_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
