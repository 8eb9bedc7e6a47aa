use statsgate_core::parse_env;
use std::time::Duration;

/// Retrier tuning.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub rate_limit_retries: u32,
    pub timeout_retries: u32,
    pub network_retries: u32,
    pub unknown_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_percent: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            rate_limit_retries: 3,
            timeout_retries: 2,
            network_retries: 4,
            unknown_retries: 2,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            jitter_percent: 0.25,
        }
    }
}

impl RetryConfig {
    /// Loads from environment (`MAX_RETRIES`, `BASE_BACKOFF_MS`,
    /// `MAX_BACKOFF_MS`). Per-class attempt budgets have no named env
    /// var, so they keep their built-in defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: parse_env("MAX_RETRIES", defaults.max_retries),
            rate_limit_retries: defaults.rate_limit_retries,
            timeout_retries: defaults.timeout_retries,
            network_retries: defaults.network_retries,
            unknown_retries: defaults.unknown_retries,
            base_backoff: Duration::from_millis(parse_env(
                "BASE_BACKOFF_MS",
                defaults.base_backoff.as_millis() as u64,
            )),
            max_backoff: Duration::from_millis(parse_env(
                "MAX_BACKOFF_MS",
                defaults.max_backoff.as_millis() as u64,
            )),
            jitter_percent: defaults.jitter_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = RetryConfig::default();
        assert_eq!(config.rate_limit_retries, 3);
        assert_eq!(config.timeout_retries, 2);
        assert_eq!(config.network_retries, 4);
    }
}
