//! Background writer for the stats breaker's optional cross-restart state.
//!
//! The breaker only exposes a coarse snapshot (state, failure count, open
//! count) through `detailed_status`, so what gets restored on restart is
//! just "was the breaker tripped", not the sliding window's contents.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use statsgate_circuitbreaker::persistence::{load, save, PersistedState};
use statsgate_orchestrator::upstream::ReqwestSteamClient;
use statsgate_orchestrator::Orchestrator;
use tokio::task::JoinHandle;

/// Loads persisted state (if any and not stale) and restores it onto the
/// stats breaker before the gateway starts taking traffic.
pub async fn restore(orchestrator: &Orchestrator<ReqwestSteamClient>, path: &std::path::Path) {
    if let Some(state) = load(path).await {
        tracing::info!(state = %state.state().as_str(), "restoring circuit breaker state from disk");
        orchestrator.restore_stats_breaker(state.state());
    }
}

pub fn spawn(
    orchestrator: Arc<Orchestrator<ReqwestSteamClient>>,
    path: PathBuf,
    interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if shutdown.load(Ordering::Acquire) {
                    return;
                }

                let status = orchestrator.stats_breaker_status();
                let state = PersistedState::capture(status.state, status.failure_count, status.open_count);
                if let Err(err) = save(&path, &state).await {
                    tracing::warn!(error = %err, path = %path.display(), "failed to persist circuit breaker state");
                }
            }
        })
    };
    (handle, shutdown)
}
