use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::SharedState;

/// GET /api/throttle/{identifier}
///
/// Read-only view of every throttle that applies to the identifier. Does not
/// record a request.
pub async fn get_status(
    State(state): State<SharedState>,
    Path(identifier): Path<String>,
) -> Json<Value> {
    let (account_locked, unlock_at) = state.limiter.is_account_locked(&identifier);

    Json(json!({
        "identifier": identifier,
        "blocked": state.limiter.is_blocked(&identifier),
        "account_locked": account_locked,
        "unlock_at": unlock_at,
        "login": state.limiter.login_status(&identifier)
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LockRequest {
    /// Falls back to the configured lock duration.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// POST /api/throttle/{identifier}/lock
pub async fn lock_account(
    State(state): State<SharedState>,
    Path(identifier): Path<String>,
    Json(body): Json<LockRequest>,
) -> (StatusCode, Json<Value>) {
    if body.duration_minutes == Some(0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "message": "duration_minutes must be greater than zero"
            })),
        );
    }

    let unlock_at = state.limiter.lock_account(&identifier, body.duration_minutes);
    tracing::info!("account lock placed via admin API for {}", identifier);

    (
        StatusCode::OK,
        Json(json!({
            "status": "locked",
            "identifier": identifier,
            "unlock_at": unlock_at
        })),
    )
}
