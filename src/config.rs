//! Aggregated startup configuration.
//!
//! Every component loads its own config from the environment; this just
//! collects them in one place plus the handful of root-level settings
//! (bind address, ingress/admin/upstream credentials) that don't belong
//! to any single component.

use std::net::SocketAddr;

use statsgate_cache::CacheConfig;
use statsgate_circuitbreaker::CircuitBreakerConfig;
use statsgate_orchestrator::OrchestratorConfig;
use statsgate_ratelimiter::RateLimiterConfig;
use statsgate_retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub upstream_base_url: String,
    pub upstream_api_key: Option<String>,
    pub api_key: Option<String>,
    pub admin_token: Option<String>,
    pub cache: CacheConfig,
    pub stats_breaker: CircuitBreakerConfig,
    pub achievements_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    pub rate_limiter: RateLimiterConfig,
    pub orchestrator: OrchestratorConfig,
}

impl GatewayConfig {
    /// Loads every component's config from the environment ('s
    /// named keys) plus the root-level settings "Auth" names:
    /// the upstream credential key, the optional ingress `API_KEY`, and
    /// the optional admin token.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(err) => {
                    tracing::warn!(%err, "invalid BIND_ADDR, falling back to 0.0.0.0:8080");
                    None
                }
            })
            .unwrap_or_else(|| "0.0.0.0:8080".parse().expect("fallback bind addr is valid"));

        Self {
            bind_addr,
            upstream_base_url: std::env::var("STEAM_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.steampowered.com".to_string()),
            upstream_api_key: non_empty_env("STEAM_API_KEY"),
            api_key: non_empty_env("API_KEY"),
            admin_token: non_empty_env("ADMIN_TOKEN"),
            cache: CacheConfig::from_env(),
            stats_breaker: CircuitBreakerConfig::from_env(),
            achievements_breaker: CircuitBreakerConfig::from_env(),
            retry: RetryConfig::from_env(),
            rate_limiter: RateLimiterConfig::from_env(),
            orchestrator: OrchestratorConfig::from_env(),
        }
    }

    /// Logs the fully-resolved configuration once at startup, before
    /// the gateway begins serving traffic.
    pub fn log_effective_config(&self) {
        tracing::info!(
            bind_addr = %self.bind_addr,
            upstream_base_url = %self.upstream_base_url,
            upstream_api_key_set = self.upstream_api_key.is_some(),
            ingress_api_key_set = self.api_key.is_some(),
            admin_token_set = self.admin_token.is_some(),
            cache_max_entries = self.cache.max_entries,
            cache_ttl_player_stats_secs = self.cache.ttl_player_stats.as_secs(),
            cache_ttl_achievements_secs = self.cache.ttl_achievements.as_secs(),
            cache_ttl_combined_secs = self.cache.ttl_combined.as_secs(),
            breaker_request_volume_threshold = self.stats_breaker.request_volume_threshold,
            breaker_failure_threshold = self.stats_breaker.failure_threshold,
            breaker_reset_timeout_secs = self.stats_breaker.reset_timeout.as_secs(),
            retry_max_retries = self.retry.max_retries,
            retry_base_backoff_ms = self.retry.base_backoff.as_millis(),
            retry_max_backoff_ms = self.retry.max_backoff.as_millis(),
            rate_limit_max_reqs = self.rate_limiter.max_reqs,
            rate_limit_window_secs = self.rate_limiter.refresh_window.as_secs(),
            overall_timeout_secs = self.orchestrator.overall_timeout.as_secs(),
            api_timeout_secs = self.orchestrator.api_timeout.as_secs(),
            achievements_timeout_secs = self.orchestrator.achievements_timeout.as_secs(),
            "effective configuration"
        );
        if self.admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set, admin endpoints are disabled (deny-by-default)");
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
