use statsgate_core::{clamp_with_warning, parse_env};
use std::time::Duration;

/// Configuration for the per-client token bucket.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_reqs: usize,
    pub refresh_window: Duration,
    pub prune_interval: Duration,
    pub name: String,
}

impl RateLimiterConfig {
    /// Bucket is pruned once idle for this long (: `2 * refill_window`).
    pub fn prune_threshold(&self) -> Duration {
        self.refresh_window * 2
    }

    /// Loads config from environment (`RATE_LIMIT_PER_MIN`,
    /// `BURST_LIMIT`), clamping to sane bounds and warning on
    /// out-of-range or invalid values.
    ///
    /// Both env vars set the same token bucket capacity: with the
    /// default 60s window, "N requests per minute" and "burst of N" are
    /// the same number. `BURST_LIMIT` wins if both are set, since it
    /// names the quantity this bucket actually enforces (capacity
    /// available immediately, not a smoothed rate).
    pub fn from_env() -> Self {
        let builder = RateLimiterConfigBuilder::new();
        let per_min = parse_env("RATE_LIMIT_PER_MIN", builder.max_reqs);
        let max_reqs = clamp_with_warning(
            "max_reqs",
            parse_env("BURST_LIMIT", per_min),
            1,
            100_000,
        );
        Self {
            max_reqs,
            refresh_window: builder.refresh_window,
            prune_interval: builder.prune_interval,
            name: builder.name,
        }
    }
}

/// Builder for `RateLimiterConfig`, with defaults baked in.
pub struct RateLimiterConfigBuilder {
    max_reqs: usize,
    refresh_window: Duration,
    prune_interval: Duration,
    name: String,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_reqs: 60,
            refresh_window: Duration::from_secs(60),
            prune_interval: Duration::from_secs(5 * 60),
            name: "<unnamed>".to_string(),
        }
    }

    pub fn max_reqs(mut self, n: usize) -> Self {
        self.max_reqs = n;
        self
    }

    pub fn refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    pub fn prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = interval;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        let max_reqs = clamp_with_warning("max_reqs", self.max_reqs, 1, 100_000);
        RateLimiterConfig {
            max_reqs,
            refresh_window: self.refresh_window,
            prune_interval: self.prune_interval,
            name: self.name,
        }
    }
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_reqs_is_clamped_to_lower_bound() {
        let config = RateLimiterConfigBuilder::new().max_reqs(0).build();
        assert_eq!(config.max_reqs, 1);
    }

    #[test]
    fn prune_threshold_is_double_the_refresh_window() {
        let config = RateLimiterConfigBuilder::new()
            .refresh_window(Duration::from_secs(30))
            .build();
        assert_eq!(config.prune_threshold(), Duration::from_secs(60));
    }
}
