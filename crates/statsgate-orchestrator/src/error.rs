use statsgate_core::GatewayError;
use statsgate_retry::RetryError;
use thiserror::Error;

use crate::types::FetchResult;

/// Errors from `fetch_player`. Only the critical stats fetch can fail
/// the overall call; the partial `FetchResult` is carried alongside the
/// error so callers can still log/serve diagnostics.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("stats fetch failed: {error}")]
    StatsFailed {
        error: GatewayError<String>,
        partial: Box<FetchResult>,
    },
}

impl OrchestratorError {
    pub fn gateway_error(&self) -> &GatewayError<String> {
        match self {
            OrchestratorError::StatsFailed { error, .. } => error,
        }
    }
}

/// Collapses a retrier outcome into the plain `GatewayError` the breaker
/// and the caller both expect. Cancellation (deadline/shutdown) surfaces
/// as a timeout; exhaustion surfaces the last observed error unchanged.
pub fn flatten_retry_error(err: RetryError<GatewayError<String>>) -> GatewayError<String> {
    match err {
        RetryError::Cancelled { .. } => GatewayError::Timeout,
        RetryError::Exhausted { source, .. } => source,
    }
}
