//! `/metrics` JSON endpoint exposing a snapshot of every component's
//! counters.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::AppState;

pub async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let stats_status = state.orchestrator.stats_breaker_status();
    let ach_status = state.orchestrator.achievements_breaker_status();
    let combined_cache = state.orchestrator.combined_cache_stats();

    Json(json!({
        "circuit_breakers": {
            "stats": {
                "state": stats_status.state.as_str(),
                "failure_rate": stats_status.failure_rate,
                "window_size": stats_status.window_size,
                "open_count": stats_status.open_count,
            },
            "achievements": {
                "state": ach_status.state.as_str(),
                "failure_rate": ach_status.failure_rate,
                "window_size": ach_status.window_size,
                "open_count": ach_status.open_count,
            },
        },
        "combined_cache": {
            "hits": combined_cache.hits,
            "misses": combined_cache.misses,
            "entries": combined_cache.entries,
            "evictions": combined_cache.lru_evictions + combined_cache.ttl_evictions,
        },
        "rate_limiter": {
            "buckets": state.rate_limiter.bucket_count(),
        },
    }))
}
