//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Logging configuration consumed by `telemetry::init_tracing`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Accept full directives ("info,resilience_core=debug"); check the default level only.
        let default_level = self.level.split(',').next().unwrap_or("").trim();
        let known = ["trace", "debug", "info", "warn", "error", "off"];
        if default_level.contains('=') || known.contains(&default_level.to_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ValidationError::InvalidLogLevel(self.level.clone()))
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
