//! Unified error taxonomy shared across the gateway.
//!
//! Every component-specific error eventually maps into a [`GatewayError`]
//! so the HTTP layer only needs one `IntoResponse` impl. Components that
//! want to carry their own error type through the pipeline can do so via
//! the `Application(E)` variant.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The shared error taxonomy, expressed as kinds rather than concrete types.
#[derive(Debug, Error)]
pub enum GatewayError<E = std::convert::Infallible> {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("resource not found")]
    NotFound,

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream returned status {status}")]
    UpstreamHttp { status: u16 },

    #[error("circuit open, no fallback available")]
    CircuitOpen,

    #[error("network error: {message}")]
    Network { message: String },

    #[error("operation timed out")]
    Timeout,

    #[error("player profile is private")]
    PrivateProfile,

    #[error("no achievements available")]
    NoAchievements,

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("shutting down")]
    Shutdown,

    #[error(transparent)]
    Application(E),
}

impl<E> GatewayError<E> {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. }
                | GatewayError::UpstreamHttp { status: 500..=599 }
                | GatewayError::Network { .. }
                | GatewayError::Timeout
        )
    }

    /// Machine-stable code surfaced in `details.code` for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "validation_error",
            GatewayError::NotFound => "not_found",
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::UpstreamHttp { .. } => "upstream_http",
            GatewayError::CircuitOpen => "circuit_open",
            GatewayError::Network { .. } => "network_error",
            GatewayError::Timeout => "timeout",
            GatewayError::PrivateProfile => "private_profile",
            GatewayError::NoAchievements => "no_achievements",
            GatewayError::Internal { .. } => "internal",
            GatewayError::Shutdown => "shutdown",
            GatewayError::Application(_) => "application_error",
        }
    }

    /// HTTP status that maps this error kind to.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Validation { .. } => 400,
            GatewayError::NotFound => 404,
            GatewayError::RateLimited { .. } => 429,
            GatewayError::Timeout => 408,
            GatewayError::UpstreamHttp { .. } | GatewayError::Network { .. } => 502,
            GatewayError::PrivateProfile | GatewayError::NoAchievements => 200,
            GatewayError::Internal { .. } | GatewayError::Application(_) => 500,
            GatewayError::Shutdown | GatewayError::CircuitOpen => 503,
        }
    }

    pub fn map_application<F, E2>(self, f: F) -> GatewayError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            GatewayError::Application(e) => GatewayError::Application(f(e)),
            GatewayError::Validation { message } => GatewayError::Validation { message },
            GatewayError::NotFound => GatewayError::NotFound,
            GatewayError::RateLimited { retry_after } => GatewayError::RateLimited { retry_after },
            GatewayError::UpstreamHttp { status } => GatewayError::UpstreamHttp { status },
            GatewayError::CircuitOpen => GatewayError::CircuitOpen,
            GatewayError::Network { message } => GatewayError::Network { message },
            GatewayError::Timeout => GatewayError::Timeout,
            GatewayError::PrivateProfile => GatewayError::PrivateProfile,
            GatewayError::NoAchievements => GatewayError::NoAchievements,
            GatewayError::Internal { message } => GatewayError::Internal { message },
            GatewayError::Shutdown => GatewayError::Shutdown,
        }
    }
}

impl<E: fmt::Debug> GatewayError<E> {
    pub fn application_error(&self) -> Option<&E> {
        match self {
            GatewayError::Application(e) => Some(e),
            _ => None,
        }
    }
}

const _ASSERT_SEND_SYNC: fn() = || {
    fn assert<T: Send + Sync + 'static>() {}
    assert::<GatewayError<std::io::Error>>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_spec() {
        assert_eq!(GatewayError::<()>::NotFound.http_status(), 404);
        assert_eq!(
            GatewayError::<()>::RateLimited { retry_after: None }.http_status(),
            429
        );
        assert_eq!(GatewayError::<()>::Timeout.http_status(), 408);
        assert_eq!(GatewayError::<()>::Shutdown.http_status(), 503);
        assert_eq!(GatewayError::<()>::CircuitOpen.http_status(), 503);
        assert_eq!(
            GatewayError::<()>::UpstreamHttp { status: 503 }.http_status(),
            502
        );
    }

    #[test]
    fn retryable_kinds() {
        assert!(GatewayError::<()>::RateLimited { retry_after: None }.is_retryable());
        assert!(GatewayError::<()>::UpstreamHttp { status: 503 }.is_retryable());
        assert!(!GatewayError::<()>::NotFound.is_retryable());
        assert!(!GatewayError::<()>::Validation {
            message: "bad".into()
        }
        .is_retryable());
    }
}
