//! Resilience monitor daemon.
//!
//! Loads configuration from the environment, builds the resilience context,
//! and logs health snapshots until interrupted.

use std::process::ExitCode;

use resilience_core::application::ResilienceContext;
use resilience_core::config::AppConfig;
use resilience_core::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = telemetry::init_tracing(&config.logging) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    let context = match ResilienceContext::build(&config).await {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build resilience context");
            return ExitCode::FAILURE;
        }
    };

    context.start();
    tracing::info!(
        interval_secs = config.health.interval_secs,
        "Monitoring; press Ctrl-C to stop"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    if let Some(snapshot) = context.latest_health() {
        match serde_json::to_string(&snapshot) {
            Ok(json) => tracing::info!(snapshot = %json, "Final health snapshot"),
            Err(e) => tracing::warn!(error = %e, "Could not serialize health snapshot"),
        }
    }

    context.shutdown().await;
    ExitCode::SUCCESS
}
