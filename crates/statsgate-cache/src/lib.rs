//! TTL+LRU cache with corruption detection (component A).
//!
//! An `lru`-backed store with a builder/event pattern, extended with a
//! corruption detection/quarantine/recovery policy and a background
//! maintenance worker.

mod config;
mod corruption;
mod entry;
mod error;
mod events;
mod stats;
mod store;
pub mod worker;

pub use config::{CacheConfig, CacheConfigBuilder, CorruptionMode, KeyClass};
pub use corruption::{CorruptionKind, RecoveryOutcome};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use events::{CacheEvent, CorruptionAction, EvictionReason};
pub use stats::CacheStats;

use crate::store::{CacheStore, InsertOutcome};
use serde::Serialize;
use statsgate_core::EventListeners;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// The cache itself. `V` is the opaque stored
/// value; it must be serializable so corruption checks can compute a
/// canonical size.
pub struct Cache<V> {
    store: Mutex<CacheStore<V>>,
    stats: stats::StatsCounters,
    config: CacheConfig,
    listeners: EventListeners<CacheEvent>,
    shutting_down: AtomicBool,
}

impl<V: Clone + Serialize> Cache<V> {
    pub fn new(config: CacheConfig) -> Self {
        let store = CacheStore::new(config.max_entries, config.quarantine_capacity);
        Self {
            store: Mutex::new(store),
            stats: stats::StatsCounters::new(),
            config,
            listeners: EventListeners::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn add_listener(&mut self, listener: impl statsgate_core::EventListener<CacheEvent> + 'static) {
        self.listeners.add(listener);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn emit(&self, event: CacheEvent) {
        self.listeners.emit(&event);
    }

    /// `set`.
    pub fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        if self.is_shutting_down() {
            return Err(CacheError::ShuttingDown);
        }
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        let size = serde_json::to_vec(&value).map(|b| b.len().max(1)).unwrap_or(1);
        let new_entry = CacheEntry::new(value, ttl, size);

        let mut store = self.store.lock().expect("cache store lock poisoned");
        if store.peek(key).is_none() && store.is_full() {
            if let Some((evicted_key, _)) = store.evict_lru() {
                self.stats.record_lru_eviction();
                self.emit(CacheEvent::Eviction {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    key: evicted_key,
                    reason: EvictionReason::Lru,
                });
            }
        }
        match store.insert(key.to_string(), new_entry) {
            InsertOutcome::Evicted { key: evicted_key, .. } => {
                self.stats.record_lru_eviction();
                self.emit(CacheEvent::Eviction {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    key: evicted_key,
                    reason: EvictionReason::Lru,
                });
            }
            InsertOutcome::Inserted => {}
        }
        drop(store);
        self.stats.record_set();
        Ok(())
    }

    /// `get`. Never fails; returns `None` on any kind of miss.
    pub fn get(&self, key: &str) -> Option<V> {
        if self.is_shutting_down() {
            self.stats.record_miss();
            return None;
        }
        let mut store = self.store.lock().expect("cache store lock poisoned");
        let Some(entry) = store.get_mut(key) else {
            drop(store);
            self.stats.record_miss();
            self.emit(CacheEvent::Miss {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                key: key.to_string(),
                expired: false,
            });
            return None;
        };
        if entry.is_expired() {
            // The entry stays in the store past expiry so
            // `get_stale`/`execute_with_stale_cache` can still serve it;
            // only LRU capacity pressure or the corruption sweep's
            // max-age check actually reclaim it.
            drop(store);
            self.stats.record_miss();
            self.stats.record_ttl_eviction();
            self.emit(CacheEvent::Miss {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                key: key.to_string(),
                expired: true,
            });
            return None;
        }
        entry.touch();
        let value = entry.value.clone();
        drop(store);
        self.stats.record_hit();
        self.emit(CacheEvent::Hit {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            key: key.to_string(),
        });
        Some(value)
    }

    /// Looks up `key` ignoring expiry (used by the circuit breaker's stale
    /// fallback `execute_with_stale_cache`). Refreshes
    /// `accessed_at` on hit so repeated fallbacks keep the key warm.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        let entry = store.get_mut(key)?;
        entry.touch();
        Some(entry.value.clone())
    }

    /// `delete`. Idempotent.
    pub fn delete(&self, key: &str) {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        store.remove(key);
        drop(store);
        self.stats.record_delete();
    }

    /// `clear`. Atomic.
    pub fn clear(&self) {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        store.clear();
    }

    /// Linear scan removing all currently expired entries; returns the
    /// count removed. Not called by the maintenance worker itself
    /// (expired entries stay available for stale fallback until LRU
    /// pressure or the corruption sweep's max-age check reclaims them);
    /// this is a forced purge for callers that want one.
    pub fn evict_expired(&self) -> usize {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        let keys = store.iter_keys();
        let mut evicted = 0;
        for key in keys {
            let expired = store.peek(&key).map(|e| e.is_expired()).unwrap_or(false);
            if expired {
                store.remove(&key);
                evicted += 1;
            }
        }
        drop(store);
        for _ in 0..evicted {
            self.stats.record_ttl_eviction();
        }
        evicted
    }

    /// Corruption sweep, run every fifth maintenance cycle, applying the
    /// configured `CorruptionMode`.
    pub fn sweep_corruption(&self) {
        let mut store = self.store.lock().expect("cache store lock poisoned");
        let keys = store.iter_keys();
        for key in keys {
            let kind = match store.peek(&key) {
                Some(entry) => corruption::detect(&key, entry, &self.config),
                None => continue,
            };
            let Some(kind) = kind else { continue };

            self.stats.record_corruption();
            match self.config.corruption_mode {
                CorruptionMode::Purge => {
                    store.remove(&key);
                    self.emit(CacheEvent::Corruption {
                        name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        key,
                        action: CorruptionAction::Purged,
                    });
                }
                CorruptionMode::Quarantine => {
                    if let Some(entry) = store.remove(&key) {
                        if store.quarantine(key.clone(), entry).is_err() {
                            // overflow falls back to purge
                            self.emit(CacheEvent::Corruption {
                                name: self.config.name.clone(),
                                timestamp: Instant::now(),
                                key,
                                action: CorruptionAction::Purged,
                            });
                        } else {
                            self.emit(CacheEvent::Corruption {
                                name: self.config.name.clone(),
                                timestamp: Instant::now(),
                                key,
                                action: CorruptionAction::Quarantined,
                            });
                        }
                    }
                }
                CorruptionMode::AttemptRecover => {
                    if let Some(entry) = store.get_mut(&key) {
                        match corruption::attempt_recover(kind, entry) {
                            RecoveryOutcome::Recovered => {
                                self.stats.record_recovery();
                                self.emit(CacheEvent::Recovery {
                                    name: self.config.name.clone(),
                                    timestamp: Instant::now(),
                                    key,
                                });
                            }
                            RecoveryOutcome::Unrecoverable => {
                                store.remove(&key);
                                self.emit(CacheEvent::Corruption {
                                    name: self.config.name.clone(),
                                    timestamp: Instant::now(),
                                    key,
                                    action: CorruptionAction::Purged,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    /// `stats()`. O(1) snapshot.
    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock().expect("cache store lock poisoned");
        self.stats.snapshot(store.len(), store.memory_usage())
    }

    /// "Shutdown". Idempotent; safe to call from multiple
    /// concurrent callers, all of whom observe the same outcome.
    pub fn close(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.emit(CacheEvent::Shutdown {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache() -> Cache<u32> {
        Cache::new(CacheConfigBuilder::new().max_entries(3).build())
    }

    #[test]
    fn s1_cache_hit() {
        let cache = cache();
        cache.set("p:1", 100, Duration::from_secs(300)).unwrap();
        assert_eq!(cache.get("p:1"), Some(100));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn s2_ttl_expiry() {
        let cache = cache();
        cache.set("p:2", 1, Duration::from_millis(50)).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.get("p:2"), None);
        let stats = cache.stats();
        assert_eq!(stats.ttl_evictions, 1);
    }

    #[test]
    fn s3_lru_eviction_order() {
        let cache = cache();
        cache.set("k1", 1, Duration::from_secs(60)).unwrap();
        cache.set("k2", 2, Duration::from_secs(60)).unwrap();
        cache.set("k3", 3, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k1"), Some(1));
        assert_eq!(cache.get("k3"), Some(3));
        cache.set("k4", 4, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.get("k1"), Some(1));
        assert_eq!(cache.get("k3"), Some(3));
        assert_eq!(cache.get("k4"), Some(4));
    }

    /// Invariant 2: every hit monotonically increases `accessed_at` for
    /// its key, ordered consistently with the wall clock.
    #[test]
    fn successive_hits_advance_accessed_at_monotonically() {
        let cache = cache();
        cache.set("p:1", 1, Duration::from_secs(60)).unwrap();

        let store = cache.store.lock().unwrap();
        let after_set = store.peek("p:1").unwrap().accessed_at;
        drop(store);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("p:1"), Some(1));
        let store = cache.store.lock().unwrap();
        let after_first_hit = store.peek("p:1").unwrap().accessed_at;
        drop(store);
        assert!(after_first_hit > after_set);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("p:1"), Some(1));
        let store = cache.store.lock().unwrap();
        let after_second_hit = store.peek("p:1").unwrap().accessed_at;
        assert!(after_second_hit > after_first_hit);
    }

    #[test]
    fn delete_is_idempotent() {
        let cache = cache();
        cache.set("k", 1, Duration::from_secs(60)).unwrap();
        cache.delete("k");
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn set_fails_after_close() {
        let cache = cache();
        cache.close();
        let result = cache.set("k", 1, Duration::from_secs(60));
        assert_eq!(result, Err(CacheError::ShuttingDown));
    }

    #[test]
    fn get_is_a_miss_after_close() {
        let cache = cache();
        cache.set("k", 1, Duration::from_secs(60)).unwrap();
        cache.close();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn empty_key_is_rejected() {
        let cache = cache();
        assert_eq!(
            cache.set("", 1, Duration::from_secs(60)),
            Err(CacheError::EmptyKey)
        );
    }

    #[test]
    fn stale_lookup_ignores_expiry() {
        let cache = cache();
        cache.set("p:7", 99, Duration::from_millis(10)).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("p:7"), None);
        assert_eq!(cache.get_stale("p:7"), Some(99));
    }
}
