//! Cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which remote tier backs the local cache.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoteBackend {
    /// Local tier only
    #[default]
    None,
    /// In-process stand-in (tests, single-node setups)
    Memory,
    /// Redis, configured by the `redis` section
    Redis,
}

/// Multi-tier cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries in the local tier
    pub max_size: usize,

    /// TTL for values populated from a remote hit without a reported TTL
    pub default_ttl_secs: u64,

    /// Fraction of the TTL after which a read signals refresh-ahead
    pub refresh_threshold: f64,

    pub remote: RemoteBackend,

    /// Namespace prepended to remote keys
    pub key_prefix: String,

    /// Bound on each remote call
    pub remote_timeout_ms: u64,

    /// Fail startup instead of running local-only when the remote is unreachable
    pub require_remote: bool,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidCacheSize);
        }
        if !(self.refresh_threshold > 0.0 && self.refresh_threshold <= 1.0) {
            return Err(ValidationError::InvalidRefreshThreshold(self.refresh_threshold));
        }
        if self.default_ttl_secs == 0 {
            return Err(ValidationError::InvalidTimeout("cache.default_ttl_secs"));
        }
        if self.remote_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("cache.remote_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_secs: 3600,
            refresh_threshold: 0.8,
            remote: RemoteBackend::None,
            key_prefix: "cache:".to_string(),
            remote_timeout_ms: 500,
            require_remote: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.remote, RemoteBackend::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = CacheConfig {
            max_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidCacheSize)));
    }

    #[test]
    fn test_refresh_threshold_bounds() {
        for bad in [0.0, -0.5, 1.5] {
            let config = CacheConfig {
                refresh_threshold: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
        let config = CacheConfig {
            refresh_threshold: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
