//! HTTP surface: router wiring and the shared `AppState` every
//! handler reads from.

pub mod admin;
pub mod error;
pub mod health;
mod middleware;
pub mod metrics;
pub mod players;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use statsgate_orchestrator::Orchestrator;
use statsgate_orchestrator::upstream::ReqwestSteamClient;
use statsgate_ratelimiter::RateLimiter;

use crate::config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub orchestrator: Arc<Orchestrator<ReqwestSteamClient>>,
    pub rate_limiter: Arc<RateLimiter>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/players/:id", get(players::get_player))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        .route("/metrics", get(metrics::get_metrics))
        .route("/admin/cache/evict", post(admin::evict_cache))
        .route("/admin/circuit", get(admin::circuit_status))
        .with_state(state)
        .layer(from_fn(middleware::request_id_and_security_headers))
        .layer(TraceLayer::new_for_http())
}
