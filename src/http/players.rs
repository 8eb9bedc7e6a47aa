//! `GET /players/:id`, the ingress endpoint that ties the rate limiter,
//! orchestrator, and error envelope together into one handler.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde_json::{json, Value};

use statsgate_core::GatewayError;
use statsgate_orchestrator::OrchestratorError;

use super::error::AppError;
use super::middleware::RequestId;
use super::AppState;
use crate::client_id;

const MAX_PLAYER_ID_LEN: usize = 64;

pub async fn get_player(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(player_id): Path<String>,
) -> Response {
    if let Some(expected) = &state.config.api_key {
        let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return AppError::new(request_id, GatewayError::Validation {
                message: "missing or invalid API key".to_string(),
            })
            .into_response();
        }
    }

    if player_id.is_empty() || player_id.len() > MAX_PLAYER_ID_LEN || !player_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return AppError::new(
            request_id,
            GatewayError::Validation {
                message: format!("invalid player id '{player_id}'"),
            },
        )
        .into_response();
    }

    let client_id = client_id::derive(addr, &headers, state.config.api_key.as_deref());
    if !state.rate_limiter.allow(&client_id) {
        return rate_limited_response(&request_id, &state);
    }

    tracing::info!(request_id, player_id, "fetching player");

    match state.orchestrator.fetch_player(&player_id).await {
        Ok(result) => {
            let body = render_success(&player_id, result);
            let mut response = (StatusCode::OK, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert("x-request-id", value);
            }
            response
        }
        Err(OrchestratorError::StatsFailed { error, partial }) => {
            tracing::warn!(request_id, player_id, error = %error, "stats fetch failed");
            let _ = partial;
            AppError::new(request_id, error).into_response()
        }
    }
}

fn rate_limited_response(request_id: &str, state: &AppState) -> Response {
    let window = state.config.rate_limiter.refresh_window.as_secs().max(1);
    let mut response = AppError::new(
        request_id.to_string(),
        GatewayError::RateLimited {
            retry_after: Some(state.config.rate_limiter.refresh_window),
        },
    )
    .into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&state.config.rate_limiter.max_reqs.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&window.to_string()) {
        headers.insert("x-ratelimit-window", value);
    }
    response
}

/// Builds ingress shape by layering achievements and per-field
/// diagnostics onto the raw upstream stats document. The stats wire
/// schema carries `id`/`steam_id`/`name`/`avatar`/`public`/`matches`/
/// `last_updated` directly (unlike achievements, spec names no separate
/// minimum contract for it), so those fields pass through unchanged.
fn render_success(player_id: &str, result: statsgate_orchestrator::types::FetchResult) -> Value {
    let mut body = match result.stats {
        Some(Value::Object(map)) => Value::Object(map),
        Some(other) => json!({ "id": player_id, "raw": other }),
        None => json!({ "id": player_id }),
    };

    let achievements = json!({
        "total": result.achievements.summary.total,
        "unlocked": result.achievements.summary.unlocked,
        "mapped": result.achievements.mapped_achievements,
        "adepts": {
            "survivors": result.achievements.adept_survivors,
            "killers": result.achievements.adept_killers,
        },
    });

    let sources = json!({
        "stats": result.data_sources.stats,
        "achievements": result.data_sources.achievements,
    });

    if let Value::Object(map) = &mut body {
        map.insert("achievements".to_string(), achievements);
        map.insert("sources".to_string(), sources);
    }

    body
}
