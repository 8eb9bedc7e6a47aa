use statsgate_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Observability events emitted by the rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    PermitAcquired {
        name: String,
        timestamp: Instant,
        client_id: String,
        remaining: usize,
    },
    PermitRejected {
        name: String,
        timestamp: Instant,
        client_id: String,
    },
    BucketCreated {
        name: String,
        timestamp: Instant,
        client_id: String,
    },
    BucketPruned {
        name: String,
        timestamp: Instant,
        client_id: String,
        idle_for: Duration,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "ratelimiter.permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "ratelimiter.permit_rejected",
            RateLimiterEvent::BucketCreated { .. } => "ratelimiter.bucket_created",
            RateLimiterEvent::BucketPruned { .. } => "ratelimiter.bucket_pruned",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. }
            | RateLimiterEvent::BucketCreated { timestamp, .. }
            | RateLimiterEvent::BucketPruned { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { name, .. }
            | RateLimiterEvent::PermitRejected { name, .. }
            | RateLimiterEvent::BucketCreated { name, .. }
            | RateLimiterEvent::BucketPruned { name, .. } => name,
        }
    }
}
