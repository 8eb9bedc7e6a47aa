//! Background maintenance worker.
//!
//! Wakes every `cleanup_interval` and, every fifth cycle, runs a
//! corruption sweep (which reclaims entries stale beyond
//! `max_age_threshold`). It does not evict merely-TTL-expired entries;
//! those stay in the store so the circuit breaker's stale-cache fallback
//! can still serve them. Panics inside a cycle are caught so the worker
//! keeps running.

use crate::Cache;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub fn spawn<V>(cache: Arc<Cache<V>>) -> JoinHandle<()>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut cycle: u64 = 0;
        loop {
            let interval = cache.config().cleanup_interval;
            tokio::time::sleep(interval).await;
            if cache.is_shutting_down() {
                return;
            }

            cycle += 1;
            let started = Instant::now();
            let run_corruption_sweep = cycle % 5 == 0;

            let result = catch_unwind(AssertUnwindSafe(|| {
                if run_corruption_sweep {
                    cache.sweep_corruption();
                }
            }));

            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(panic_message = %message, "cache maintenance cycle panicked, continuing");
            }

            let elapsed = started.elapsed();
            if elapsed > Duration::from_millis(100) {
                tracing::warn!(elapsed_ms = elapsed.as_millis(), "cache maintenance cycle slow");
            }
        }
    })
}
