//! Background pruner.
//!
//! Wakes every `prune_interval` and removes buckets idle for longer than
//! `2 * refresh_window`, following the same panic-tolerant wake-loop shape
//! `statsgate-cache`'s maintenance worker uses.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::limiter::RateLimiter;

pub fn spawn(limiter: Arc<RateLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let interval = limiter.config().prune_interval;
            tokio::time::sleep(interval).await;
            if limiter.is_shutting_down() {
                return;
            }

            let result = catch_unwind(AssertUnwindSafe(|| limiter.prune_idle()));
            match result {
                Ok(pruned) if pruned > 0 => {
                    tracing::debug!(pruned, "rate limiter pruned idle buckets");
                }
                Ok(_) => {}
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    tracing::error!(panic_message = %message, "rate limiter prune cycle panicked, continuing");
                }
            }
        }
    })
}
