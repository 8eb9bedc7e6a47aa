use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use statsgate_cache::Cache;
use statsgate_circuitbreaker::{
    is_upstream_failure, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
};
use statsgate_core::{EventListener, EventListeners, GatewayError};
use statsgate_retry::{RetryConfig, Retrier};
use tokio_util::sync::CancellationToken;

use crate::cache_bridge::CacheStaleSource;
use crate::config::OrchestratorConfig;
use crate::error::{flatten_retry_error, OrchestratorError};
use crate::events::OrchestratorEvent;
use crate::merger;
use crate::types::{AchievementsPayload, DataSource, DataSources, FetchResult, SourceDiagnostic};
use crate::upstream::SteamClient;

enum AchievementsOutcome {
    Live(AchievementsPayload),
    Stale(AchievementsPayload),
    Failed(GatewayError<String>),
}

/// Fan-out orchestrator (component D). Runs the stats and achievements
/// fetches in parallel under one overall deadline, each through its own
/// retrier-wrapped circuit breaker, then hands fresh achievement data
/// to the safe merger before persisting.
pub struct Orchestrator<C> {
    client: C,
    config: OrchestratorConfig,
    retrier: Retrier,
    stats_breaker: CircuitBreaker<serde_json::Value, GatewayError<String>>,
    achievements_breaker: CircuitBreaker<AchievementsPayload, GatewayError<String>>,
    combined_cache: Arc<Cache<AchievementsPayload>>,
    combined_ttl: Duration,
    listeners: EventListeners<OrchestratorEvent>,
}

impl<C: SteamClient> Orchestrator<C> {
    pub fn new(
        client: C,
        config: OrchestratorConfig,
        retry_config: RetryConfig,
        stats_breaker_config: CircuitBreakerConfig,
        achievements_breaker_config: CircuitBreakerConfig,
        combined_cache: Arc<Cache<AchievementsPayload>>,
        combined_ttl: Duration,
    ) -> Self {
        Self {
            client,
            config,
            retrier: Retrier::new(retry_config),
            stats_breaker: CircuitBreaker::new(stats_breaker_config, is_upstream_failure),
            achievements_breaker: CircuitBreaker::new(achievements_breaker_config, is_upstream_failure),
            combined_cache,
            combined_ttl,
            listeners: EventListeners::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl EventListener<OrchestratorEvent> + 'static) {
        self.listeners.add(listener);
    }

    fn emit(&self, event: OrchestratorEvent) {
        self.listeners.emit(&event);
    }

    fn combined_key(player_id: &str) -> String {
        format!("combined:{player_id}")
    }

    /// `GET /admin/circuit`.
    pub fn stats_breaker_status(&self) -> statsgate_circuitbreaker::DetailedStatus {
        self.stats_breaker.detailed_status()
    }

    pub fn achievements_breaker_status(&self) -> statsgate_circuitbreaker::DetailedStatus {
        self.achievements_breaker.detailed_status()
    }

    /// `POST /admin/cache/evict`, single-player form.
    pub fn evict_combined_cache(&self, player_id: &str) {
        self.combined_cache.delete(&Self::combined_key(player_id));
    }

    /// `POST /admin/cache/evict`, no player id given.
    pub fn clear_combined_cache(&self) {
        self.combined_cache.clear();
    }

    /// Restores a breaker to `Open` on startup from persisted state. Only
    /// `Open` is worth restoring: the sliding window behind `Closed` or
    /// `HalfOpen` can't be faithfully replayed, and forcing `Open` is the
    /// fail-safe choice when the last known state was a tripped breaker.
    pub fn restore_stats_breaker(&self, state: CircuitState) {
        if state == CircuitState::Open {
            self.stats_breaker.force_open();
        }
    }

    pub fn restore_achievements_breaker(&self, state: CircuitState) {
        if state == CircuitState::Open {
            self.achievements_breaker.force_open();
        }
    }

    pub fn combined_cache_stats(&self) -> statsgate_cache::CacheStats {
        self.combined_cache.stats()
    }

    /// Circuit fully open with no stale data to fall back to: distinct
    /// from `UpstreamHttp` (which always renders as 502) so this path can
    /// surface 503 instead.
    fn circuit_open_error() -> GatewayError<String> {
        GatewayError::CircuitOpen
    }

    async fn fetch_stats_guarded(
        &self,
        player_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError<String>> {
        let attempt = self
            .retrier
            .execute(cancellation, "fetch_stats", |_attempt| self.client.fetch_stats(player_id));
        match tokio::time::timeout(self.config.api_timeout, attempt).await {
            Ok(result) => result.map_err(flatten_retry_error),
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    async fn fetch_stats(
        &self,
        player_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<serde_json::Value, GatewayError<String>> {
        self.stats_breaker
            .execute(|| self.fetch_stats_guarded(player_id, cancellation))
            .await
            .map_err(|err| match err {
                CircuitBreakerError::Inner(e) => e,
                CircuitBreakerError::OpenNoFallback => Self::circuit_open_error(),
            })
    }

    async fn fetch_achievements_guarded(
        &self,
        player_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<AchievementsPayload, GatewayError<String>> {
        let attempt = self.retrier.execute(cancellation, "fetch_achievements", |_attempt| {
            self.client.fetch_achievements(player_id)
        });
        match tokio::time::timeout(self.config.achievements_timeout, attempt).await {
            Ok(result) => result.map_err(flatten_retry_error),
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    /// Wraps the achievements fetch in `execute_with_stale_cache` so a
    /// down breaker serves whatever is already persisted under the
    /// combined key instead of failing outright. The breaker's `Ok`
    /// doesn't distinguish "the call itself succeeded" from "a stale
    /// entry filled in for it", so `live` records which one happened.
    async fn fetch_achievements(&self, player_id: &str, cancellation: &CancellationToken) -> AchievementsOutcome {
        let key = Self::combined_key(player_id);
        let source = CacheStaleSource(self.combined_cache.as_ref());
        let live = AtomicBool::new(false);

        let result = self
            .achievements_breaker
            .execute_with_stale_cache(&source, &key, || async {
                let outcome = self.fetch_achievements_guarded(player_id, cancellation).await;
                if outcome.is_ok() {
                    live.store(true, Ordering::Relaxed);
                }
                outcome
            })
            .await;

        match result {
            Ok(payload) if live.load(Ordering::Relaxed) => AchievementsOutcome::Live(payload),
            Ok(payload) => AchievementsOutcome::Stale(payload),
            Err(CircuitBreakerError::Inner(e)) => AchievementsOutcome::Failed(e),
            Err(CircuitBreakerError::OpenNoFallback) => AchievementsOutcome::Failed(Self::circuit_open_error()),
        }
    }

    /// `fetch_player(player_id) -> FetchResult`. Both upstream
    /// calls run concurrently under `overall_timeout`; on timeout the
    /// join future is dropped, which cancels whichever call was still
    /// in flight.
    pub async fn fetch_player(&self, player_id: &str) -> Result<FetchResult, OrchestratorError> {
        let parent_token = CancellationToken::new();
        let stats_token = parent_token.child_token();
        let ach_token = parent_token.child_token();

        let joined = tokio::time::timeout(self.config.overall_timeout, async {
            tokio::join!(
                self.fetch_stats(player_id, &stats_token),
                self.fetch_achievements(player_id, &ach_token),
            )
        })
        .await;

        let (stats_result, ach_outcome) = match joined {
            Ok(pair) => pair,
            Err(_) => {
                parent_token.cancel();
                (Err(GatewayError::Timeout), AchievementsOutcome::Failed(GatewayError::Timeout))
            }
        };

        let now = SystemTime::now();

        let (stats, stats_source, stats_diag, stats_error) = match &stats_result {
            Ok(value) => (Some(value.clone()), DataSource::Live, SourceDiagnostic::ok(), None),
            Err(err) => (
                None,
                DataSource::Unavailable,
                SourceDiagnostic::failed(err.to_string()),
                Some(err.to_string()),
            ),
        };

        let (achievements, ach_source, ach_diag, ach_error) = self.resolve_achievements(player_id, ach_outcome, now);

        self.emit(OrchestratorEvent::FetchCompleted {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            player_id: player_id.to_string(),
            stats_source,
            ach_source,
        });

        let result = FetchResult {
            stats,
            achievements,
            stats_error,
            ach_error,
            stats_source,
            ach_source,
            data_sources: DataSources {
                stats: stats_diag,
                achievements: ach_diag,
            },
        };

        match stats_result {
            Ok(_) => Ok(result),
            Err(error) => {
                self.emit(OrchestratorEvent::FetchFailed {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    player_id: player_id.to_string(),
                    error: error.to_string(),
                });
                Err(OrchestratorError::StatsFailed {
                    error,
                    partial: Box::new(result),
                })
            }
        }
    }

    /// Applies the safe merge to a freshly fetched achievements payload
    /// and persists the outcome; non-live outcomes pass through
    /// unchanged since there is nothing new to combine.
    fn resolve_achievements(
        &self,
        player_id: &str,
        outcome: AchievementsOutcome,
        now: SystemTime,
    ) -> (AchievementsPayload, DataSource, SourceDiagnostic, Option<String>) {
        match outcome {
            AchievementsOutcome::Stale(payload) => (payload, DataSource::Cache, SourceDiagnostic::ok(), None),
            AchievementsOutcome::Failed(err) => (
                AchievementsPayload::empty(now),
                DataSource::Unavailable,
                SourceDiagnostic::failed(err.to_string()),
                Some(err.to_string()),
            ),
            AchievementsOutcome::Live(fresh) => {
                let key = Self::combined_key(player_id);
                // last_updated = 0 here (not `now`) so a first-ever fetch isn't
                // mistaken by the staleness check for an update older than
                // what's "already cached".
                let existing = self.combined_cache.get(&key).unwrap_or_else(|| {
                    let mut baseline = AchievementsPayload::empty(now);
                    baseline.last_updated = 0;
                    baseline
                });

                match merger::safe_merge(&existing, Some(&fresh), player_id, &self.config, now) {
                    Ok(outcome) => {
                        let _ = self.combined_cache.set(&key, outcome.merged.clone(), self.combined_ttl);
                        self.emit(OrchestratorEvent::MergeApplied {
                            name: self.config.name.clone(),
                            timestamp: Instant::now(),
                            player_id: player_id.to_string(),
                            changes: outcome.changes,
                        });
                        (outcome.merged, DataSource::Live, SourceDiagnostic::ok(), None)
                    }
                    Err(merge_error) => {
                        self.emit(OrchestratorEvent::MergeRejected {
                            name: self.config.name.clone(),
                            timestamp: Instant::now(),
                            player_id: player_id.to_string(),
                            reason: merge_error.to_string(),
                        });
                        if existing.is_empty() {
                            (existing, DataSource::Unavailable, SourceDiagnostic::failed(merge_error.to_string()), Some(merge_error.to_string()))
                        } else {
                            (existing, DataSource::Cache, SourceDiagnostic::failed(merge_error.to_string()), Some(merge_error.to_string()))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use statsgate_cache::CacheConfigBuilder;
    use statsgate_circuitbreaker::CircuitBreakerConfigBuilder;
    use std::sync::atomic::AtomicU32;

    struct FakeClient {
        stats_calls: AtomicU32,
        ach_calls: AtomicU32,
        stats_result: Result<serde_json::Value, GatewayError<String>>,
        ach_result: Result<AchievementsPayload, GatewayError<String>>,
    }

    impl Clone for FakeClient {
        fn clone(&self) -> Self {
            Self {
                stats_calls: AtomicU32::new(0),
                ach_calls: AtomicU32::new(0),
                stats_result: clone_gateway_result(&self.stats_result),
                ach_result: clone_ach_result(&self.ach_result),
            }
        }
    }

    fn clone_gateway_result(
        r: &Result<serde_json::Value, GatewayError<String>>,
    ) -> Result<serde_json::Value, GatewayError<String>> {
        match r {
            Ok(v) => Ok(v.clone()),
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    fn clone_ach_result(
        r: &Result<AchievementsPayload, GatewayError<String>>,
    ) -> Result<AchievementsPayload, GatewayError<String>> {
        match r {
            Ok(v) => Ok(v.clone()),
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    #[async_trait]
    impl SteamClient for FakeClient {
        async fn fetch_stats(&self, _player_id: &str) -> Result<serde_json::Value, GatewayError<String>> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            clone_gateway_result(&self.stats_result)
        }

        async fn fetch_achievements(&self, _player_id: &str) -> Result<AchievementsPayload, GatewayError<String>> {
            self.ach_calls.fetch_add(1, Ordering::SeqCst);
            clone_ach_result(&self.ach_result)
        }
    }

    fn payload(n: usize) -> AchievementsPayload {
        AchievementsPayload {
            mapped_achievements: Vec::new(),
            adept_survivors: (0..n).map(|i| (format!("s{i}"), true)).collect(),
            adept_killers: (0..n).map(|i| (format!("k{i}"), true)).collect(),
            summary: crate::types::AchievementSummary {
                total: (n * 2) as u64,
                unlocked: (n * 2) as u64,
            },
            last_updated: SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        }
    }

    fn orchestrator(client: FakeClient) -> Orchestrator<FakeClient> {
        let cache = Arc::new(Cache::new(CacheConfigBuilder::new().max_entries(16).build()));
        Orchestrator::new(
            client,
            crate::config::OrchestratorConfigBuilder::new()
                .min_valid_survivors(1)
                .min_valid_killers(1)
                .build(),
            RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
            CircuitBreakerConfigBuilder::new().name("stats-test").build(),
            CircuitBreakerConfigBuilder::new().name("achievements-test").build(),
            cache,
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn successful_fetch_reports_both_sources_live() {
        let client = FakeClient {
            stats_calls: AtomicU32::new(0),
            ach_calls: AtomicU32::new(0),
            stats_result: Ok(serde_json::json!({"rank": "gold"})),
            ach_result: Ok(payload(2)),
        };
        let orchestrator = orchestrator(client);
        let result = orchestrator.fetch_player("p1").await.unwrap();
        assert_eq!(result.stats_source, DataSource::Live);
        assert_eq!(result.ach_source, DataSource::Live);
        assert!(result.stats.is_some());
    }

    #[tokio::test]
    async fn stats_failure_fails_the_whole_call_but_keeps_achievements() {
        let client = FakeClient {
            stats_calls: AtomicU32::new(0),
            ach_calls: AtomicU32::new(0),
            stats_result: Err(GatewayError::NotFound),
            ach_result: Ok(payload(2)),
        };
        let orchestrator = orchestrator(client);
        let err = orchestrator.fetch_player("p1").await.unwrap_err();
        match err {
            OrchestratorError::StatsFailed { partial, .. } => {
                assert_eq!(partial.stats_source, DataSource::Unavailable);
                assert_eq!(partial.ach_source, DataSource::Live);
            }
        }
    }

    #[tokio::test]
    async fn achievements_failure_preserves_overall_success() {
        let client = FakeClient {
            stats_calls: AtomicU32::new(0),
            ach_calls: AtomicU32::new(0),
            stats_result: Ok(serde_json::json!({"rank": "gold"})),
            ach_result: Err(GatewayError::NotFound),
        };
        let orchestrator = orchestrator(client);
        let result = orchestrator.fetch_player("p1").await.unwrap();
        assert_eq!(result.ach_source, DataSource::Unavailable);
        assert!(result.achievements.is_empty());
        assert!(result.ach_error.is_some());
    }

    #[tokio::test]
    async fn s7_fan_out_partial() {
        let client = FakeClient {
            stats_calls: AtomicU32::new(0),
            ach_calls: AtomicU32::new(0),
            stats_result: Ok(serde_json::json!({"matches": 100})),
            ach_result: Err(GatewayError::PrivateProfile),
        };
        let orchestrator = orchestrator(client);
        let result = orchestrator.fetch_player("p1").await.unwrap();

        assert!(result.stats.is_some());
        assert!(result.achievements.is_empty());
        assert_eq!(result.ach_source, DataSource::Unavailable);
        assert!(!result.data_sources.achievements.success);
        assert!(result.data_sources.achievements.error.is_some());
    }
}
