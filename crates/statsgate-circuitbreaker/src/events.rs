use statsgate_core::ResilienceEvent;
use std::time::Instant;

use crate::state::CircuitState;

/// Observability events for the breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    StateTransition {
        name: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
    },
    CallPermitted {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    CallRejected {
        name: String,
        timestamp: Instant,
    },
    FallbackServed {
        name: String,
        timestamp: Instant,
        stale_cache: bool,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "circuitbreaker.state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "circuitbreaker.call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "circuitbreaker.call_rejected",
            CircuitBreakerEvent::FallbackServed { .. } => "circuitbreaker.fallback_served",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::FallbackServed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. }
            | CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::FallbackServed { name, .. } => name,
        }
    }
}
