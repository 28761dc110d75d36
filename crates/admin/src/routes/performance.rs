use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::SharedState;

const REPORT_SLOW_QUERIES: usize = 20;

/// GET /health/performance
///
/// Monitor summary, cache statistics and the slowest recent operations.
pub async fn get_report(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "performance": state.monitor.get_performance_summary(),
        "cache": state.cache.get_stats(),
        "slow_queries": state.monitor.get_slow_queries(REPORT_SLOW_QUERIES),
        "timestamp": state.clock.now().to_rfc3339()
    }))
}

/// POST /health/performance/reset
pub async fn reset_stats(State(state): State<SharedState>) -> Json<Value> {
    state.monitor.reset_stats();
    tracing::info!("performance statistics reset via admin API");

    Json(json!({ "status": "reset" }))
}
