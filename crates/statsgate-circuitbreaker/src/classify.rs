//! Failure classification: which `GatewayError` variants count against
//! the breaker's failure window.

use statsgate_core::GatewayError;

/// Decides whether an error should count as a circuit failure.
///
/// Only rate-limiting, 5xx upstream responses, network errors, and
/// timeouts count. Client-caused 4xx (bad input, private profile, not
/// found) pass through untouched. A wrong or private player id is not
/// evidence the upstream API is unhealthy.
pub fn is_upstream_failure<E>(error: &GatewayError<E>) -> bool {
    error.is_retryable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_limited_counts_as_failure() {
        let err: GatewayError<()> = GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(1)),
        };
        assert!(is_upstream_failure(&err));
    }

    #[test]
    fn not_found_does_not_count_as_failure() {
        let err: GatewayError<()> = GatewayError::NotFound;
        assert!(!is_upstream_failure(&err));
    }

    #[test]
    fn private_profile_does_not_count_as_failure() {
        let err: GatewayError<()> = GatewayError::PrivateProfile;
        assert!(!is_upstream_failure(&err));
    }

    #[test]
    fn upstream_5xx_counts_as_failure() {
        let err: GatewayError<()> = GatewayError::UpstreamHttp { status: 503 };
        assert!(is_upstream_failure(&err));
    }
}
