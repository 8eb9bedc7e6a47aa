use std::time::Duration;

use rand::Rng;

use crate::classify::ErrorClass;

/// Pluggable backoff strategy.
pub trait IntervalFunction: Send + Sync {
    fn next_interval(&self, attempt: u32) -> Duration;
}

/// backoff formula:
/// `backoff_i = min(base * multiplier^(i-1) * class_factor, max_backoff)`,
/// then `± jitter_percent` uniform jitter, clamped to `>= base`.
pub struct ClassAwareBackoff {
    pub base: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
    pub jitter_percent: f64,
    pub class_factor: f64,
}

impl ClassAwareBackoff {
    pub fn for_class(base: Duration, max_backoff: Duration, jitter_percent: f64, class: ErrorClass) -> Self {
        Self {
            base,
            multiplier: 2.0,
            max_backoff,
            jitter_percent,
            class_factor: class.backoff_multiplier(),
        }
    }
}

impl IntervalFunction for ClassAwareBackoff {
    /// `attempt` is 1-indexed; the first attempt (0) incurs no delay and
    /// is never passed here.
    fn next_interval(&self, attempt: u32) -> Duration {
        let exponent = (attempt.saturating_sub(1)) as i32;
        let raw = self.base.as_secs_f64() * self.multiplier.powi(exponent) * self.class_factor;
        let capped = raw.min(self.max_backoff.as_secs_f64());

        let jitter_span = capped * self.jitter_percent;
        let jitter = rand::rng().random_range(-jitter_span..=jitter_span);
        let jittered = (capped + jitter).max(self.base.as_secs_f64());

        Duration::from_secs_f64(jittered.max(0.0))
    }
}
