use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;
use statsgate_core::EventListeners;

use crate::config::CircuitBreakerConfig;
use crate::error::CircuitBreakerError;
use crate::events::CircuitBreakerEvent;
use crate::state::CircuitState;
use crate::window::SlidingWindow;

/// Looks up a possibly-stale cached value by key, used by
/// `execute_with_stale_cache`. Implemented by the orchestrator over its
/// cache instances so this crate doesn't depend on `statsgate-cache`.
pub trait StaleSource<V> {
    fn get_stale(&self, key: &str) -> Option<V>;
}

struct Inner {
    state: CircuitState,
    last_state_change: Instant,
    last_failure_time: Option<Instant>,
    success_count: usize,
    open_count: u64,
    window: SlidingWindow,
}

/// Time-windowed circuit breaker with stale-cache and synthetic fallback
/// (component B): a single time-based window plus stale-cache fallback
/// on rejection.
pub struct CircuitBreaker<T, E> {
    inner: Mutex<Inner>,
    state_atomic: AtomicU8,
    config: CircuitBreakerConfig,
    listeners: EventListeners<CircuitBreakerEvent>,
    classify_failure: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    synthetic_fallback: Option<Arc<dyn Fn() -> T + Send + Sync>>,
}

impl<T: Clone, E> CircuitBreaker<T, E> {
    pub fn new(
        config: CircuitBreakerConfig,
        classify_failure: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        let window = SlidingWindow::new(config.window_duration);
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                last_state_change: Instant::now(),
                last_failure_time: None,
                success_count: 0,
                open_count: 0,
                window,
            }),
            state_atomic: AtomicU8::new(CircuitState::Closed as u8),
            config,
            listeners: EventListeners::new(),
            classify_failure: Arc::new(classify_failure),
            synthetic_fallback: None,
        }
    }

    pub fn add_listener(&mut self, listener: impl statsgate_core::EventListener<CircuitBreakerEvent> + 'static) {
        self.listeners.add(listener);
    }

    pub fn with_synthetic_fallback(mut self, fallback: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.synthetic_fallback = Some(Arc::new(fallback));
        self
    }

    /// Lock-free read of the current state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    fn emit(&self, event: CircuitBreakerEvent) {
        self.listeners.emit(&event);
    }

    /// Admits or rejects a call attempt, performing the Open→HalfOpen
    /// transition when the jittered reset timeout has elapsed.
    fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure_time
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::MAX);
                let jitter = rand::rng().random_range(0.0..0.2);
                let threshold = self.config.reset_timeout.mul_f64(1.0 + jitter);
                if elapsed > threshold {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    true
                } else {
                    drop(inner);
                    self.emit(CircuitBreakerEvent::CallRejected {
                        name: self.config.name.clone(),
                        timestamp: Instant::now(),
                    });
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        self.state_atomic.store(to as u8, Ordering::Release);
        inner.last_state_change = Instant::now();
        if to == CircuitState::Open {
            inner.open_count += 1;
        }
        inner.success_count = 0;
        if to == CircuitState::Closed {
            inner.window.clear();
        }
        self.emit(CircuitBreakerEvent::StateTransition {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            from,
            to,
        });
        tracing::info!(breaker = %self.config.name, ?from, ?to, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.config.name.clone(),
                "to" => to.as_str()
            )
            .increment(1);
            metrics::gauge!("circuitbreaker_state", "circuitbreaker" => self.config.name.clone())
                .set(to as u8 as f64);
        }
    }

    fn record_outcome(&self, success: bool) {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                if success {
                    inner.success_count += 1;
                    if inner.success_count >= self.config.success_reset {
                        self.transition(&mut inner, CircuitState::Closed);
                    }
                } else {
                    inner.last_failure_time = Some(Instant::now());
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            _ => {
                inner.window.record(success);
                if !success {
                    inner.last_failure_time = Some(Instant::now());
                }
                let (size, _failures) = inner.window.stats();
                if size >= self.config.request_volume_threshold {
                    let rate = inner.window.failure_rate();
                    if rate >= self.config.failure_threshold {
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
        }
    }

    /// `execute(fn)`.
    pub async fn execute<F, Fut>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire() {
            return self.fallback_or_open_error();
        }
        match f().await {
            Ok(value) => {
                self.record_outcome(true);
                Ok(value)
            }
            Err(err) => {
                let is_failure = (self.classify_failure)(&err);
                self.record_outcome(is_failure);
                if let Some(fallback) = &self.synthetic_fallback {
                    self.emit(CircuitBreakerEvent::FallbackServed {
                        name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        stale_cache: false,
                    });
                    Ok(fallback())
                } else {
                    Err(CircuitBreakerError::Inner(err))
                }
            }
        }
    }

    /// `execute_with_stale_cache(key, fn)`.
    pub async fn execute_with_stale_cache<F, Fut>(
        &self,
        source: &impl StaleSource<T>,
        key: &str,
        f: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire() {
            return self.stale_or_open_error(source, key);
        }
        match f().await {
            Ok(value) => {
                self.record_outcome(true);
                Ok(value)
            }
            Err(err) => {
                let is_failure = (self.classify_failure)(&err);
                self.record_outcome(is_failure);
                match source.get_stale(key) {
                    Some(value) => {
                        self.emit(CircuitBreakerEvent::FallbackServed {
                            name: self.config.name.clone(),
                            timestamp: Instant::now(),
                            stale_cache: true,
                        });
                        Ok(value)
                    }
                    None => Err(CircuitBreakerError::Inner(err)),
                }
            }
        }
    }

    fn fallback_or_open_error(&self) -> Result<T, CircuitBreakerError<E>> {
        if let Some(fallback) = &self.synthetic_fallback {
            self.emit(CircuitBreakerEvent::FallbackServed {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                stale_cache: false,
            });
            Ok(fallback())
        } else {
            Err(CircuitBreakerError::OpenNoFallback)
        }
    }

    fn stale_or_open_error(
        &self,
        source: &impl StaleSource<T>,
        key: &str,
    ) -> Result<T, CircuitBreakerError<E>> {
        match source.get_stale(key) {
            Some(value) => {
                self.emit(CircuitBreakerEvent::FallbackServed {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    stale_cache: true,
                });
                Ok(value)
            }
            None => Err(CircuitBreakerError::OpenNoFallback),
        }
    }

    /// "`reset()` forces Closed, clears counters, metrics, and window."
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        inner.window.clear();
        inner.success_count = 0;
        inner.last_failure_time = None;
        self.transition(&mut inner, CircuitState::Closed);
    }

    pub fn force_open(&self) {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        inner.last_failure_time = Some(Instant::now());
        self.transition(&mut inner, CircuitState::Open);
    }

    pub fn force_closed(&self) {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        self.transition(&mut inner, CircuitState::Closed);
    }

    /// `detailed_status()`.
    pub fn detailed_status(&self) -> DetailedStatus {
        let mut inner = self.inner.lock().expect("circuit lock poisoned");
        let (window_size, failures) = inner.window.stats();
        DetailedStatus {
            state: inner.state,
            window_size,
            failure_count: failures,
            failure_rate: if window_size == 0 {
                0.0
            } else {
                failures as f64 / window_size as f64
            },
            success_count: inner.success_count,
            open_count: inner.open_count,
            last_failure_time: inner.last_failure_time,
            time_in_state: inner.last_state_change.elapsed(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetailedStatus {
    pub state: CircuitState,
    pub window_size: usize,
    pub failure_count: usize,
    pub failure_rate: f64,
    pub success_count: usize,
    pub open_count: u64,
    pub last_failure_time: Option<Instant>,
    pub time_in_state: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfigBuilder;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfigBuilder::new()
            .request_volume_threshold(2)
            .failure_threshold(0.5)
            .reset_timeout(Duration::from_millis(20))
            .success_reset(1)
            .build()
    }

    #[tokio::test]
    async fn opens_after_failure_threshold_breached() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config(), |_| true);
        let _ = breaker.execute(|| async { Err::<u32, _>("boom".to_string()) }).await;
        let _ = breaker.execute(|| async { Err::<u32, _>("boom".to_string()) }).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn open_circuit_rejects_without_fallback() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config(), |_| true);
        breaker.force_open();
        let result = breaker.execute(|| async { Ok::<u32, String>(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::OpenNoFallback)));
    }

    #[tokio::test]
    async fn synthetic_fallback_is_served_when_open() {
        let breaker: CircuitBreaker<u32, String> =
            CircuitBreaker::new(config(), |_| true).with_synthetic_fallback(|| 42);
        breaker.force_open();
        let result = breaker.execute(|| async { Ok::<u32, String>(1) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn non_failure_classified_errors_do_not_trip_the_breaker() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config(), |_| false);
        let _ = breaker.execute(|| async { Err::<u32, _>("not our fault".to_string()) }).await;
        let _ = breaker.execute(|| async { Err::<u32, _>("not our fault".to_string()) }).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn reset_forces_closed() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config(), |_| true);
        breaker.force_open();
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    struct MapStale(std::collections::HashMap<String, u32>);

    impl StaleSource<u32> for MapStale {
        fn get_stale(&self, key: &str) -> Option<u32> {
            self.0.get(key).copied()
        }
    }

    #[tokio::test]
    async fn s4_breaker_trip() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(
            CircuitBreakerConfigBuilder::new()
                .request_volume_threshold(2)
                .failure_threshold(0.5)
                .reset_timeout(Duration::from_millis(20))
                .success_reset(1)
                .build(),
            |_| true,
        );
        for _ in 0..3 {
            let _ = breaker.execute(|| async { Err::<u32, _>("boom".to_string()) }).await;
        }
        let calls_before = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls_before);
        let result = breaker
            .execute(|| async move {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok::<u32, String>(1)
            })
            .await;
        assert_eq!(calls_before.load(Ordering::Relaxed), 0);
        assert!(matches!(result, Err(CircuitBreakerError::OpenNoFallback)));
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn s5_half_open_recovery() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(
            CircuitBreakerConfigBuilder::new()
                .request_volume_threshold(2)
                .failure_threshold(0.5)
                .reset_timeout(Duration::from_millis(50))
                .success_reset(2)
                .build(),
            |_| true,
        );
        for _ in 0..2 {
            let _ = breaker.execute(|| async { Err::<u32, _>("boom".to_string()) }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let first = breaker.execute(|| async { Ok::<u32, String>(1) }).await;
        assert_eq!(first.unwrap(), 1);
        let second = breaker.execute(|| async { Ok::<u32, String>(2) }).await;
        assert_eq!(second.unwrap(), 2);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn s5_half_open_failure_reopens() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(
            CircuitBreakerConfigBuilder::new()
                .request_volume_threshold(2)
                .failure_threshold(0.5)
                .reset_timeout(Duration::from_millis(50))
                .success_reset(2)
                .build(),
            |_| true,
        );
        for _ in 0..2 {
            let _ = breaker.execute(|| async { Err::<u32, _>("boom".to_string()) }).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        let _ = breaker.execute(|| async { Err::<u32, _>("still down".to_string()) }).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn s6_stale_fallback() {
        let breaker: CircuitBreaker<u32, String> = CircuitBreaker::new(config(), |_| true);
        breaker.force_open();
        let mut primed = std::collections::HashMap::new();
        primed.insert("p:7".to_string(), 77);
        let source = MapStale(primed);

        let result = breaker
            .execute_with_stale_cache(&source, "p:7", || async { Err::<u32, _>("down".to_string()) })
            .await;
        assert_eq!(result.unwrap(), 77);
    }
}
