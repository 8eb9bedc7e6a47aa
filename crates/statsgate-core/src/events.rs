//! Panic-safe event bus shared by every resilience component.
//!
//! Each component defines its own event enum (`CacheEvent`,
//! `CircuitBreakerEvent`, ...) and implements [`ResilienceEvent`] for it.
//! Listeners are registered through an [`EventListeners`] collection and
//! invoked synchronously on emission; a panicking listener is caught and
//! logged rather than allowed to unwind into the caller.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Marker + accessor trait implemented by every component's event enum.
pub trait ResilienceEvent: fmt::Debug + Send + Sync {
    /// Short, stable name of this event's variant, e.g. `"cache.hit"`.
    fn event_type(&self) -> &'static str;
    /// When the event occurred.
    fn timestamp(&self) -> Instant;
    /// Name of the component instance that emitted this event.
    fn pattern_name(&self) -> &str;
}

/// Receives events of a specific type.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of listeners for one event type, cheap to clone and share.
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: impl EventListener<E> + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Invokes every registered listener with `event`. A panicking listener
    /// is caught, logged, and counted; it never propagates to the caller.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if let Err(panic) = result {
                let message = panic_message(&panic);
                tracing::warn!(
                    listener_index = index,
                    pattern = event.pattern_name(),
                    event_type = event.event_type(),
                    panic_message = %message,
                    "event listener panicked"
                );
                #[cfg(feature = "metrics")]
                metrics::counter!("statsgate_event_listener_panics_total").increment(1);
            }
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ResilienceEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

/// Adapts a plain closure into an [`EventListener`].
pub struct FnListener<E, F> {
    f: F,
    _marker: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestEvent {
        timestamp: Instant,
    }

    impl ResilienceEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "test.fired"
        }
        fn timestamp(&self) -> Instant {
            self.timestamp
        }
        fn pattern_name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn emits_to_all_listeners() {
        let mut listeners = EventListeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let c = Arc::clone(&count);
            listeners.add(FnListener::new(move |_: &TestEvent| {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }
        listeners.emit(&TestEvent {
            timestamp: Instant::now(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panicking_listener_does_not_abort_emission() {
        let mut listeners = EventListeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        listeners.add(FnListener::new(|_: &TestEvent| panic!("boom")));
        let c = Arc::clone(&count);
        listeners.add(FnListener::new(move |_: &TestEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(&TestEvent {
            timestamp: Instant::now(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_by_default() {
        let listeners: EventListeners<TestEvent> = EventListeners::new();
        assert!(listeners.is_empty());
        assert_eq!(listeners.len(), 0);
    }
}
