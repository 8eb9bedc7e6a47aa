use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::Instant;

use statsgate_core::EventListeners;

use crate::bucket::TokenBucket;
use crate::config::RateLimiterConfig;
use crate::events::RateLimiterEvent;

/// Per-client token bucket rate limiter (component D), backed by a
/// full-window-refill algorithm keyed by client identity. Every call
/// mutates its bucket's token count, so `allow` always takes the map's
/// exclusive lock; a shared-lock lookup is only meaningful for the
/// multi-step reads the pruner performs separately (see `pruner.rs`).
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, TokenBucket>>,
    config: RateLimiterConfig,
    listeners: EventListeners<RateLimiterEvent>,
    shutting_down: AtomicBool,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            config,
            listeners: EventListeners::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Stops admitting new buckets and clears existing ones. The pruner
    /// is stopped first by the caller, then this is called. Idempotent.
    pub fn close(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lock_write().clear();
    }

    pub fn add_listener(&mut self, listener: impl statsgate_core::EventListener<RateLimiterEvent> + 'static) {
        self.listeners.add(listener);
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    fn emit(&self, event: RateLimiterEvent) {
        self.listeners.emit(&event);
    }

    /// `allow(client_id) -> bool`.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.lock_write();

        let is_new = !buckets.contains_key(client_id);
        let bucket = buckets
            .entry(client_id.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.max_reqs, now));

        let admitted = if is_new {
            true
        } else {
            bucket.try_acquire(self.config.max_reqs, self.config.refresh_window, now)
        };
        let remaining = bucket.remaining();
        drop(buckets);

        if is_new {
            self.emit(RateLimiterEvent::BucketCreated {
                name: self.config.name.clone(),
                timestamp: now,
                client_id: client_id.to_string(),
            });
        }

        if admitted {
            self.emit(RateLimiterEvent::PermitAcquired {
                name: self.config.name.clone(),
                timestamp: now,
                client_id: client_id.to_string(),
                remaining,
            });
        } else {
            self.emit(RateLimiterEvent::PermitRejected {
                name: self.config.name.clone(),
                timestamp: now,
                client_id: client_id.to_string(),
            });
        }

        #[cfg(feature = "metrics")]
        {
            let outcome = if admitted { "admitted" } else { "rejected" };
            metrics::counter!(
                "ratelimiter_requests_total",
                "ratelimiter" => self.config.name.clone(),
                "outcome" => outcome
            )
            .increment(1);
        }

        admitted
    }

    /// Removes buckets idle for longer than `2 * refresh_window`.
    /// Returns the number pruned.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let threshold = self.config.prune_threshold();
        let mut buckets = self.lock_write();

        let stale: Vec<(String, std::time::Duration)> = buckets
            .iter()
            .filter_map(|(client_id, bucket)| {
                let idle = bucket.idle_for(now);
                (idle >= threshold).then(|| (client_id.clone(), idle))
            })
            .collect();

        for (client_id, _) in &stale {
            buckets.remove(client_id);
        }
        drop(buckets);

        for (client_id, idle_for) in &stale {
            self.emit(RateLimiterEvent::BucketPruned {
                name: self.config.name.clone(),
                timestamp: now,
                client_id: client_id.clone(),
                idle_for: *idle_for,
            });
        }

        stale.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.lock_read().len()
    }

    fn lock_write(&self) -> RwLockWriteGuard<'_, HashMap<String, TokenBucket>> {
        match self.buckets.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, TokenBucket>> {
        match self.buckets.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
