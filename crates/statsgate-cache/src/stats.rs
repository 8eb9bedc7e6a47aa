use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic counters and gauges backing `CacheStats`.
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    ttl_evictions: AtomicU64,
    lru_evictions: AtomicU64,
    corruption_events: AtomicU64,
    recovery_events: AtomicU64,
    started_at: Instant,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            ttl_evictions: AtomicU64::new(0),
            lru_evictions: AtomicU64::new(0),
            corruption_events: AtomicU64::new(0),
            recovery_events: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_ttl_eviction(&self) {
        self.ttl_evictions.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_lru_eviction(&self) {
        self.lru_evictions.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_corruption(&self) {
        self.corruption_events.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_recovery(&self) {
        self.recovery_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, memory_usage: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            Some(hits as f64 / (hits + misses) as f64)
        } else {
            None
        };
        let average_key_size = if entries > 0 {
            memory_usage as f64 / entries as f64
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            ttl_evictions: self.ttl_evictions.load(Ordering::Relaxed),
            lru_evictions: self.lru_evictions.load(Ordering::Relaxed),
            corruption_events: self.corruption_events.load(Ordering::Relaxed),
            recovery_events: self.recovery_events.load(Ordering::Relaxed),
            entries,
            memory_usage,
            hit_rate,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            average_key_size,
        }
    }
}

impl Default for StatsCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// O(1) snapshot of cache statistics, returned by `stats()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub ttl_evictions: u64,
    pub lru_evictions: u64,
    pub corruption_events: u64,
    pub recovery_events: u64,
    pub entries: usize,
    pub memory_usage: usize,
    pub hit_rate: Option<f64>,
    pub uptime_seconds: u64,
    pub average_key_size: f64,
}
