use statsgate_core::ResilienceEvent;
use std::time::Instant;

/// Observability events emitted by the cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit {
        name: String,
        timestamp: Instant,
        key: String,
    },
    Miss {
        name: String,
        timestamp: Instant,
        key: String,
        expired: bool,
    },
    Eviction {
        name: String,
        timestamp: Instant,
        key: String,
        reason: EvictionReason,
    },
    Corruption {
        name: String,
        timestamp: Instant,
        key: String,
        action: CorruptionAction,
    },
    Recovery {
        name: String,
        timestamp: Instant,
        key: String,
    },
    Shutdown {
        name: String,
        timestamp: Instant,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Ttl,
    Lru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionAction {
    Purged,
    Quarantined,
    Recovered,
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "cache.hit",
            CacheEvent::Miss { .. } => "cache.miss",
            CacheEvent::Eviction { .. } => "cache.eviction",
            CacheEvent::Corruption { .. } => "cache.corruption",
            CacheEvent::Recovery { .. } => "cache.recovery",
            CacheEvent::Shutdown { .. } => "cache.shutdown",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. }
            | CacheEvent::Corruption { timestamp, .. }
            | CacheEvent::Recovery { timestamp, .. }
            | CacheEvent::Shutdown { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CacheEvent::Hit { name, .. }
            | CacheEvent::Miss { name, .. }
            | CacheEvent::Eviction { name, .. }
            | CacheEvent::Corruption { name, .. }
            | CacheEvent::Recovery { name, .. }
            | CacheEvent::Shutdown { name, .. } => name,
        }
    }
}
