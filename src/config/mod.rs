//! Application configuration module
//!
//! Configuration is loaded from environment variables using the `config` and
//! `dotenvy` crates. Variables use the `RESILIENCE` prefix and nested values
//! are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use resilience_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Local cache holds up to {} entries", config.cache.max_size);
//! ```

mod cache;
mod circuit_breaker;
mod error;
mod health;
mod logging;
mod redis;

pub use cache::{CacheConfig, RemoteBackend};
pub use circuit_breaker::{BreakerOverride, CircuitBreakerSettings};
pub use error::{ConfigError, ValidationError};
pub use health::HealthConfig;
pub use logging::LoggingConfig;
pub use redis::RedisConfig;

pub use crate::adapters::rate_limiter::RateLimitConfig;

use serde::Deserialize;

/// Root configuration
///
/// Every section has defaults, so an empty environment yields a working
/// local-only setup. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Breaker defaults and named overrides
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    /// Multi-tier cache sizing, TTL and remote tier selection
    #[serde(default)]
    pub cache: CacheConfig,

    /// Redis connection, used when `cache.remote = redis`
    #[serde(default)]
    pub redis: RedisConfig,

    /// Sliding-window rate limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Background health monitoring
    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RESILIENCE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RESILIENCE__CACHE__MAX_SIZE=5000` -> `cache.max_size = 5000`
    /// - `RESILIENCE__CACHE__REMOTE=redis` -> `cache.remote = Redis`
    /// - `RESILIENCE__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("RESILIENCE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The Redis section is only checked when Redis is the selected remote
    /// tier.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.circuit_breaker.validate()?;
        self.cache.validate()?;
        if self.cache.remote == RemoteBackend::Redis {
            self.redis.validate()?;
        }
        validate_rate_limit(&self.rate_limit)?;
        self.health.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ValidationError> {
    if config.requests_per_minute == 0 {
        return Err(ValidationError::InvalidRateLimit("requests_per_minute"));
    }
    if config.window_secs == 0 {
        return Err(ValidationError::InvalidRateLimit("window_secs"));
    }
    if config.max_keys == 0 {
        return Err(ValidationError::InvalidRateLimit("max_keys"));
    }
    if config.sweep_interval_secs == 0 {
        return Err(ValidationError::InvalidTimeout("rate_limit.sweep_interval_secs"));
    }
    Ok(())
}
