//! Resilience gateway in front of the Steam Dead by Daylight stats API.
//! Wires the five resilience components behind one axum HTTP surface
//! and runs their background workers.

mod client_id;
mod config;
mod http;
mod persistence;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use statsgate_cache::Cache;
use statsgate_core::FnListener;
use statsgate_orchestrator::upstream::ReqwestSteamClient;
use statsgate_orchestrator::{Orchestrator, OrchestratorEvent};
use statsgate_ratelimiter::RateLimiter;

use crate::config::GatewayConfig;
use crate::http::AppState;

/// "optional persistence... written every 30s".
const CIRCUIT_STATE_WRITE_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = GatewayConfig::from_env();
    config.log_effective_config();
    let config = Arc::new(config);

    let client = ReqwestSteamClient::new(config.upstream_base_url.clone(), config.upstream_api_key.clone());
    let combined_cache = Arc::new(Cache::new(config.cache.clone()));
    let combined_ttl = config.cache.ttl_combined;

    let mut orchestrator = Orchestrator::new(
        client,
        config.orchestrator.clone(),
        config.retry.clone(),
        config.stats_breaker.clone(),
        config.achievements_breaker.clone(),
        Arc::clone(&combined_cache),
        combined_ttl,
    );
    orchestrator.add_listener(FnListener::new(|event: &OrchestratorEvent| {
        tracing::debug!(?event, "orchestrator event");
    }));
    let orchestrator = Arc::new(orchestrator);

    let circuit_state_path: PathBuf = std::env::var("CIRCUIT_STATE_PATH")
        .unwrap_or_else(|_| "circuit_state.json".to_string())
        .into();
    persistence::restore(&orchestrator, &circuit_state_path).await;
    let (persistence_handle, persistence_shutdown) =
        persistence::spawn(Arc::clone(&orchestrator), circuit_state_path, CIRCUIT_STATE_WRITE_INTERVAL);

    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limiter.clone()));
    let pruner_handle = statsgate_ratelimiter::pruner::spawn(Arc::clone(&rate_limiter));
    let cache_worker_handle = statsgate_cache::worker::spawn(Arc::clone(&combined_cache));

    let state = AppState {
        config: Arc::clone(&config),
        orchestrator: Arc::clone(&orchestrator),
        rate_limiter: Arc::clone(&rate_limiter),
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {}: {err}", config.bind_addr));
    tracing::info!(addr = %config.bind_addr, "statsgate listening");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server exited with error");
    }

    // shutdown order: pruner -> breaker persistence writer ->
    // cache cleanup worker -> clear cache. In-flight requests have
    // already drained by the time graceful shutdown returns, so there
    // are no orchestrator tasks left to join. Each stop below is
    // idempotent.
    rate_limiter.close();
    pruner_handle.abort();

    persistence_shutdown.store(true, Ordering::Release);
    persistence_handle.abort();

    combined_cache.close();
    cache_worker_handle.abort();
    combined_cache.clear();

    tracing::info!("statsgate shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
