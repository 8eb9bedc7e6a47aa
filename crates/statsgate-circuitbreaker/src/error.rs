use thiserror::Error;

/// Errors from a guarded call.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open and no fallback (synthetic or stale-cache) was
    /// available.
    #[error("circuit open, no fallback available")]
    OpenNoFallback,

    /// The inner call failed and propagated since no fallback applied.
    #[error("call failed: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenNoFallback)
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            CircuitBreakerError::OpenNoFallback => None,
        }
    }
}
