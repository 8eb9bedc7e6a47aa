use statsgate_core::{clamp_with_warning, parse_env, parse_env_duration_secs};
use std::time::Duration;

/// Circuit breaker tuning.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: f64,
    pub request_volume_threshold: usize,
    pub window_duration: Duration,
    pub reset_timeout: Duration,
    pub success_reset: usize,
    pub name: String,
}

impl CircuitBreakerConfig {
    /// Loads from environment (`CB_MAX_FAILS`,
    /// `CB_RESET_TIMEOUT_SECS`, `CB_HALF_OPEN_REQUESTS`).
    ///
    /// `CB_MAX_FAILS` sets `request_volume_threshold`: this breaker
    /// evaluates a failure *rate* once the window holds that many calls,
    /// rather than tripping on a raw consecutive-failure count, but
    /// `CB_MAX_FAILS` is the closest fit for naming the knob "how many
    /// failures before the breaker reacts".
    /// `CB_HALF_OPEN_REQUESTS` sets `success_reset`, the number of
    /// half-open probes that must succeed before closing.
    pub fn from_env() -> Self {
        let builder = CircuitBreakerConfigBuilder::new();
        let failure_threshold = clamp_with_warning("failure_threshold", builder.failure_threshold, 0.0, 1.0);
        Self {
            failure_threshold,
            request_volume_threshold: parse_env("CB_MAX_FAILS", builder.request_volume_threshold),
            window_duration: builder.window_duration,
            reset_timeout: parse_env_duration_secs("CB_RESET_TIMEOUT_SECS", builder.reset_timeout),
            success_reset: parse_env("CB_HALF_OPEN_REQUESTS", builder.success_reset),
            name: builder.name,
        }
    }
}

/// Builder for `CircuitBreakerConfig`, with defaults.
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: f64,
    request_volume_threshold: usize,
    window_duration: Duration,
    reset_timeout: Duration,
    success_reset: usize,
    name: String,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            failure_threshold: 0.5,
            request_volume_threshold: 10,
            window_duration: Duration::from_secs(60),
            reset_timeout: Duration::from_secs(30),
            success_reset: 3,
            name: "<unnamed>".to_string(),
        }
    }

    pub fn failure_threshold(mut self, rate: f64) -> Self {
        self.failure_threshold = rate;
        self
    }

    pub fn request_volume_threshold(mut self, n: usize) -> Self {
        self.request_volume_threshold = n;
        self
    }

    pub fn window_duration(mut self, duration: Duration) -> Self {
        self.window_duration = duration;
        self
    }

    pub fn reset_timeout(mut self, duration: Duration) -> Self {
        self.reset_timeout = duration;
        self
    }

    pub fn success_reset(mut self, n: usize) -> Self {
        self.success_reset = n;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.clamp(0.0, 1.0),
            request_volume_threshold: self.request_volume_threshold,
            window_duration: self.window_duration,
            reset_timeout: self.reset_timeout,
            success_reset: self.success_reset,
            name: self.name,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
