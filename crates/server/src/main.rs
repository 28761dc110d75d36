use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use slotguard_common::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .init();

    // Parse command-line args for config path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/slotguard.yaml".to_string());

    info!(config_path = %config_path, "starting slotguard");

    let config = AppConfig::load(&config_path)?;
    if !config.admin.enabled {
        warn!("admin API disabled, nothing to serve");
        return Ok(());
    }

    let state = slotguard_admin::new_shared_state(config.clone());

    // Passive expiry is the default; the sweep only runs when configured.
    let _sweeper = match config.rate_limit.sweep_interval() {
        Some(interval) => {
            info!(interval_secs = interval.as_secs(), "starting rate limiter sweep");
            Some(state.limiter.start_cleanup_task(interval)?)
        }
        None => None,
    };

    let monitor = state.monitor.clone();
    let result = tokio::select! {
        result = slotguard_admin::run_admin_server(state, &config.admin.listen) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    // Don't lose the partial window on shutdown.
    if let Some(collector) = monitor.collector() {
        collector.flush();
    }

    if let Err(e) = &result {
        error!(error = %e, "admin API server error");
    }
    result
}
