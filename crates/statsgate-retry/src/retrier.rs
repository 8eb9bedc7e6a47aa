use std::future::Future;
use std::time::Instant;

use statsgate_core::{EventListeners, GatewayError};
use tokio_util::sync::CancellationToken;

use crate::backoff::{ClassAwareBackoff, IntervalFunction};
use crate::budget::Budget;
use crate::classify::{classify, ErrorClass};
use crate::config::RetryConfig;
use crate::error::RetryError;
use crate::events::RetryEvent;

/// Bounded-backoff retrier with per-class budgets and cancellation
/// (component C): withdraws from a per-class budget on each attempt,
/// applies an `IntervalFunction` backoff, and emits a `RetryEvent` per
/// attempt.
pub struct Retrier {
    config: RetryConfig,
    listeners: EventListeners<RetryEvent>,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            listeners: EventListeners::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl statsgate_core::EventListener<RetryEvent> + 'static) {
        self.listeners.add(listener);
    }

    fn emit(&self, event: RetryEvent) {
        self.listeners.emit(&event);
    }

    /// `execute(ctx, op_name, attempt_fn)`.
    ///
    /// `attempt_fn(attempt_index)` is invoked up to `max_retries + 1`
    /// times. `attempt_index` is 0 on the first call.
    pub async fn execute<T, E, F, Fut>(
        &self,
        cancellation: &CancellationToken,
        op_name: &str,
        mut attempt_fn: F,
    ) -> Result<T, RetryError<GatewayError<E>>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GatewayError<E>>>,
    {
        let mut budget = Budget::new();
        let mut last_class = ErrorClass::None;
        let mut attempt: u32 = 0;

        loop {
            if cancellation.is_cancelled() {
                self.emit(RetryEvent::Cancelled {
                    op_name: op_name.to_string(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            let result = attempt_fn(attempt).await;
            attempt += 1;

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let class = classify(&error);
            last_class = class;
            self.emit(RetryEvent::AttemptFailed {
                op_name: op_name.to_string(),
                timestamp: Instant::now(),
                attempt,
                class,
            });

            let exhausted_global = attempt > self.config.max_retries;
            let non_retryable = !class.is_retryable();
            let budget_exhausted = !budget.try_consume(class, &self.config);

            if exhausted_global || non_retryable || budget_exhausted {
                self.emit(RetryEvent::Exhausted {
                    op_name: op_name.to_string(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                    last_class,
                });
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            let backoff = ClassAwareBackoff::for_class(
                self.config.base_backoff,
                self.config.max_backoff,
                self.config.jitter_percent,
                class,
            );
            let delay = backoff.next_interval(attempt);

            self.emit(RetryEvent::Retrying {
                op_name: op_name.to_string(),
                timestamp: Instant::now(),
                attempt,
                delay,
                class,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancellation.cancelled() => {
                    self.emit(RetryEvent::Cancelled {
                        op_name: op_name.to_string(),
                        timestamp: Instant::now(),
                        attempts: attempt,
                    });
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_without_retry() {
        let retrier = Retrier::new(RetryConfig::default());
        let cancellation = CancellationToken::new();
        let result: Result<u32, RetryError<GatewayError<()>>> = retrier
            .execute(&cancellation, "op", |_attempt| async { Ok(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let retrier = Retrier::new(RetryConfig {
            base_backoff: std::time::Duration::from_millis(1),
            max_backoff: std::time::Duration::from_millis(5),
            ..RetryConfig::default()
        });
        let cancellation = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let result: Result<u32, RetryError<GatewayError<()>>> = retrier
            .execute(&cancellation, "op", move |_attempt| {
                let calls = calls_clone.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(GatewayError::Timeout)
                    } else {
                        Ok(7u32)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_private_profile() {
        let retrier = Retrier::new(RetryConfig::default());
        let cancellation = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let result: Result<u32, RetryError<GatewayError<()>>> = retrier
            .execute(&cancellation, "op", move |_attempt| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::PrivateProfile) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let retrier = Retrier::new(RetryConfig::default());
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let result: Result<u32, RetryError<GatewayError<()>>> = retrier
            .execute(&cancellation, "op", |_attempt| async { Ok(1u32) })
            .await;
        assert!(matches!(result, Err(RetryError::Cancelled { attempts: 0 })));
    }
}
