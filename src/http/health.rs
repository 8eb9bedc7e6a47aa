//! `/health/live` and `/health/ready` probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use statsgate_circuitbreaker::CircuitState;

use super::AppState;

pub async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}

/// Ready iff neither upstream circuit is fully open; an open circuit
/// means this instance cannot currently serve fresh data for that
/// endpoint, which is exactly what a readiness probe should catch.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let stats_state = state.orchestrator.stats_breaker_status().state;
    let ach_state = state.orchestrator.achievements_breaker_status().state;
    let ready = stats_state != CircuitState::Open && ach_state != CircuitState::Open;

    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "degraded" },
            "stats_circuit": stats_state.as_str(),
            "achievements_circuit": ach_state.as_str(),
        })),
    )
}
