use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use slotguard_cache::{CachePattern, InvalidationEvent};

use crate::state::SharedState;

/// Body for a manual invalidation. An empty body clears the whole cache.
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub event: Option<InvalidationEvent>,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// POST /health/cache/invalidate
pub async fn invalidate(
    State(state): State<SharedState>,
    Json(body): Json<InvalidateRequest>,
) -> (StatusCode, Json<Value>) {
    let removed = match (body.event, body.prefix) {
        (Some(_), Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "message": "specify either an event or a prefix, not both"
                })),
            );
        }
        (Some(event), None) => state.dispatcher.dispatch(&event),
        (None, Some(prefix)) if prefix.is_empty() => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "message": "prefix must not be empty"
                })),
            );
        }
        (None, Some(prefix)) => state.cache.invalidate(Some(&CachePattern::prefix(prefix))),
        (None, None) => state.dispatcher.invalidate_all(),
    };

    tracing::info!(removed, "cache invalidated via admin API");

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "invalidated": removed
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;
    use slotguard_cache::keys;

    fn seed(state: &SharedState) {
        state.cache.set(keys::user_comments(1, 50), json!([]), None);
        state.cache.set(keys::user_comments(12, 50), json!([]), None);
        state.cache.set(keys::USER_STATS, json!({}), None);
    }

    #[tokio::test]
    async fn event_invalidation_is_scoped() {
        let (state, _) = test_support::state();
        seed(&state);

        let request: InvalidateRequest =
            serde_json::from_value(json!({"event": {"kind": "comment_changed", "user_id": 1}}))
                .unwrap();
        let (status, Json(body)) = invalidate(State(state.clone()), Json(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invalidated"], 1);
        assert!(state.cache.get(&keys::user_comments(12, 50)).is_some());
    }

    #[tokio::test]
    async fn prefix_invalidation() {
        let (state, _) = test_support::state();
        seed(&state);

        let request = InvalidateRequest {
            prefix: Some("user_comments:".into()),
            ..Default::default()
        };
        let (_, Json(body)) = invalidate(State(state.clone()), Json(request)).await;
        assert_eq!(body["invalidated"], 2);
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn empty_body_clears_everything() {
        let (state, _) = test_support::state();
        seed(&state);

        let (_, Json(body)) =
            invalidate(State(state.clone()), Json(InvalidateRequest::default())).await;
        assert_eq!(body["invalidated"], 3);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn conflicting_selectors_are_rejected() {
        let (state, _) = test_support::state();
        seed(&state);

        let request = InvalidateRequest {
            event: Some(InvalidationEvent::All),
            prefix: Some("user_".into()),
        };
        let (status, _) = invalidate(State(state.clone()), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.cache.len(), 3);
    }
}
