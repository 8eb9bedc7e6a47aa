use thiserror::Error;

/// Errors from `allow` (: the only failure mode is exhaustion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimiterError {
    #[error("rate limit exceeded")]
    LimitExceeded,
}
