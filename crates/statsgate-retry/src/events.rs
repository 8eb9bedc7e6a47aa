use statsgate_core::ResilienceEvent;
use std::time::{Duration, Instant};

use crate::classify::ErrorClass;

/// Observability events for the retrier: per-class counts, backoff
/// history, total duration, last error class.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    AttemptFailed {
        op_name: String,
        timestamp: Instant,
        attempt: u32,
        class: ErrorClass,
    },
    Retrying {
        op_name: String,
        timestamp: Instant,
        attempt: u32,
        delay: Duration,
        class: ErrorClass,
    },
    Exhausted {
        op_name: String,
        timestamp: Instant,
        attempts: u32,
        last_class: ErrorClass,
    },
    Cancelled {
        op_name: String,
        timestamp: Instant,
        attempts: u32,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::AttemptFailed { .. } => "retry.attempt_failed",
            RetryEvent::Retrying { .. } => "retry.retrying",
            RetryEvent::Exhausted { .. } => "retry.exhausted",
            RetryEvent::Cancelled { .. } => "retry.cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::AttemptFailed { timestamp, .. }
            | RetryEvent::Retrying { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RetryEvent::AttemptFailed { op_name, .. }
            | RetryEvent::Retrying { op_name, .. }
            | RetryEvent::Exhausted { op_name, .. }
            | RetryEvent::Cancelled { op_name, .. } => op_name,
        }
    }
}
