pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::{AppState, SharedState};

/// Build the Axum router with all admin API routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and performance
        .route("/health", get(routes::health::health_check))
        .route("/health/performance", get(routes::performance::get_report))
        .route(
            "/health/performance/reset",
            post(routes::performance::reset_stats),
        )
        .route("/health/cache/invalidate", post(routes::cache::invalidate))
        // Throttle inspection and manual locks
        .route("/api/throttle/{identifier}", get(routes::throttle::get_status))
        .route(
            "/api/throttle/{identifier}/lock",
            post(routes::throttle::lock_account),
        )
        // Prometheus metrics
        .route("/api/metrics", get(routes::metrics::get_metrics))
        .with_state(state)
        .layer(cors)
}

/// Start the admin API server on the specified address.
///
/// This function will block until the server is shut down.
pub async fn run_admin_server(state: SharedState, listen_addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("admin API server listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience function to create a SharedState from an AppConfig.
pub fn new_shared_state(config: slotguard_common::AppConfig) -> SharedState {
    Arc::new(AppState::new(config))
}
