//! Admin-guarded maintenance endpoints, deny-by-default: unset
//! `ADMIN_TOKEN` means every admin route returns 503 `admin_disabled`,
//! never a default-open fallback.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::AppState;

fn is_authorized(headers: &HeaderMap, admin_token: &str) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == admin_token)
        .unwrap_or(false)
}

fn admin_disabled() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": 503,
            "message": "admin endpoints are disabled",
            "details": { "code": "admin_disabled" },
        })),
    )
        .into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "status": 403,
            "message": "invalid admin token",
            "details": { "code": "forbidden" },
        })),
    )
        .into_response()
}

/// Checks admin auth, returning the guard failure response (if any) as
/// `Err`, else letting the caller proceed.
fn guard(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    match &state.config.admin_token {
        None => Err(admin_disabled()),
        Some(token) if is_authorized(headers, token) => Ok(()),
        Some(_) => Err(forbidden()),
    }
}

#[derive(Debug, Deserialize)]
pub struct EvictParams {
    player_id: Option<String>,
}

pub async fn evict_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EvictParams>,
) -> Response {
    if let Err(response) = guard(&state, &headers) {
        return response;
    }

    match params.player_id {
        Some(player_id) => {
            state.orchestrator.evict_combined_cache(&player_id);
            Json(json!({ "evicted": player_id })).into_response()
        }
        None => {
            state.orchestrator.clear_combined_cache();
            Json(json!({ "evicted": "all" })).into_response()
        }
    }
}

pub async fn circuit_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = guard(&state, &headers) {
        return response;
    }

    let stats = state.orchestrator.stats_breaker_status();
    let achievements = state.orchestrator.achievements_breaker_status();

    Json(json!({
        "stats": {
            "state": stats.state.as_str(),
            "failure_rate": stats.failure_rate,
            "window_size": stats.window_size,
            "failure_count": stats.failure_count,
            "open_count": stats.open_count,
            "time_in_state_secs": stats.time_in_state.as_secs(),
        },
        "achievements": {
            "state": achievements.state.as_str(),
            "failure_rate": achievements.failure_rate,
            "window_size": achievements.window_size,
            "failure_count": achievements.failure_count,
            "open_count": achievements.open_count,
            "time_in_state_secs": achievements.time_in_state.as_secs(),
        },
    }))
    .into_response()
}
