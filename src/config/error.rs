//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Timeout must be greater than zero: {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid circuit breaker settings for '{name}': {reason}")]
    InvalidCircuitBreaker { name: String, reason: String },

    #[error("Cache max_size must be at least 1")]
    InvalidCacheSize,

    #[error("Cache refresh_threshold must be in (0, 1], got {0}")]
    InvalidRefreshThreshold(f64),

    #[error("Rate limit {0} must be at least 1")]
    InvalidRateLimit(&'static str),

    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),
}
