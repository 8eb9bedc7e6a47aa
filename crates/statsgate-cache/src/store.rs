use crate::entry::CacheEntry;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Wraps `lru::LruCache` with TTL-aware operations, plus a bounded
/// quarantine map for the `Quarantine` corruption policy.
pub struct CacheStore<V> {
    entries: LruCache<String, CacheEntry<V>>,
    quarantine: HashMap<String, CacheEntry<V>>,
    quarantine_capacity: usize,
    memory_usage: usize,
}

impl<V> CacheStore<V> {
    pub fn new(max_entries: usize, quarantine_capacity: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: LruCache::new(cap),
            quarantine: HashMap::new(),
            quarantine_capacity,
            memory_usage: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.entries.cap().get()
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    /// Peeks without promoting LRU order (used for "stale regardless of
    /// expiry" lookups in the circuit breaker's fallback path).
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.peek(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.entries.get_mut(key)
    }

    /// Inserts, returning the evicted (key, entry) if the LRU store was
    /// full and had to make room, or the previous entry if this replaced
    /// an existing key.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) -> InsertOutcome<V> {
        self.memory_usage += entry.size;
        match self.entries.push(key, entry) {
            Some((evicted_key, evicted_entry)) => {
                self.memory_usage = self.memory_usage.saturating_sub(evicted_entry.size);
                InsertOutcome::Evicted {
                    key: evicted_key,
                    entry: evicted_entry,
                }
            }
            None => InsertOutcome::Inserted,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.pop(key);
        if let Some(entry) = &removed {
            self.memory_usage = self.memory_usage.saturating_sub(entry.size);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.quarantine.clear();
        self.memory_usage = 0;
    }

    pub fn iter_keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Evicts the single least-recently-used live entry to make room,
    /// independent of `push`'s automatic eviction (used when a caller
    /// needs to reclaim a slot before inserting a value of unknown size).
    pub fn evict_lru(&mut self) -> Option<(String, CacheEntry<V>)> {
        let evicted = self.entries.pop_lru();
        if let Some((_, entry)) = &evicted {
            self.memory_usage = self.memory_usage.saturating_sub(entry.size);
        }
        evicted
    }

    pub fn quarantine_len(&self) -> usize {
        self.quarantine.len()
    }

    /// Moves an entry into quarantine; if the quarantine is at capacity the
    /// caller should fall back to purge instead.
    pub fn quarantine(&mut self, key: String, entry: CacheEntry<V>) -> Result<(), CacheEntry<V>> {
        if self.quarantine.len() >= self.quarantine_capacity {
            return Err(entry);
        }
        self.quarantine.insert(key, entry);
        Ok(())
    }
}

pub enum InsertOutcome<V> {
    Inserted,
    Evicted { key: String, entry: CacheEntry<V> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn insert_and_peek_roundtrip() {
        let mut store: CacheStore<u32> = CacheStore::new(2, 10);
        store.insert("a".into(), CacheEntry::new(1, Duration::from_secs(60), 4));
        assert_eq!(store.peek("a").map(|e| e.value), Some(1));
    }

    #[test]
    fn insert_past_capacity_evicts_lru() {
        let mut store: CacheStore<u32> = CacheStore::new(2, 10);
        store.insert("a".into(), CacheEntry::new(1, Duration::from_secs(60), 4));
        store.insert("b".into(), CacheEntry::new(2, Duration::from_secs(60), 4));
        let outcome = store.insert("c".into(), CacheEntry::new(3, Duration::from_secs(60), 4));
        assert!(matches!(outcome, InsertOutcome::Evicted { key, .. } if key == "a"));
    }

    #[test]
    fn quarantine_overflow_is_rejected() {
        let mut store: CacheStore<u32> = CacheStore::new(10, 1);
        store
            .quarantine("a".into(), CacheEntry::new(1, Duration::from_secs(60), 4))
            .unwrap();
        let result = store.quarantine("b".into(), CacheEntry::new(2, Duration::from_secs(60), 4));
        assert!(result.is_err());
    }
}
