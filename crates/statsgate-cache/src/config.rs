use statsgate_core::{clamp_with_warning, parse_env_duration_secs};
use std::time::Duration;

/// Logical key classes, each independently TTL-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    PlayerStats,
    PlayerSummary,
    Achievements,
    Combined,
    Generic,
}

/// How corrupt entries are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionMode {
    Purge,
    Quarantine,
    AttemptRecover,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl: Duration,
    pub ttl_player_stats: Duration,
    pub ttl_player_summary: Duration,
    pub ttl_achievements: Duration,
    pub ttl_combined: Duration,
    pub cleanup_interval: Duration,
    pub corruption_mode: CorruptionMode,
    pub deep_corruption_checks: bool,
    pub quarantine_capacity: usize,
    pub max_age_threshold: Duration,
    pub max_serialization_time: Duration,
    pub name: String,
}

impl CacheConfig {
    pub fn ttl_for(&self, class: KeyClass) -> Duration {
        match class {
            KeyClass::PlayerStats => self.ttl_player_stats,
            KeyClass::PlayerSummary => self.ttl_player_summary,
            KeyClass::Achievements => self.ttl_achievements,
            KeyClass::Combined => self.ttl_combined,
            KeyClass::Generic => self.default_ttl,
        }
    }

    /// Loads config from environment, clamping to the bounds
    /// names and warning on out-of-range or invalid values.
    pub fn from_env() -> Self {
        let builder = CacheConfigBuilder::new();
        let max_entries = clamp_with_warning(
            "max_entries",
            builder.max_entries,
            1,
            100_000,
        );
        let cleanup_interval = if builder.cleanup_interval < Duration::from_secs(10) {
            tracing::warn!(
                requested_secs = builder.cleanup_interval.as_secs(),
                "cleanup_interval below minimum, clamping to 10s"
            );
            Duration::from_secs(10)
        } else {
            builder.cleanup_interval
        };

        // CACHE_STEAM_API_TTL and CACHE_PLAYER_STATS_TTL name the same
        // thing (the raw per-player Steam stats response is the only
        // thing cached under the PlayerStats class); CACHE_PLAYER_STATS_TTL
        // wins if both are set.
        let steam_api_ttl = parse_env_duration_secs("CACHE_STEAM_API_TTL", builder.ttl_player_stats);
        Self {
            max_entries,
            default_ttl: parse_env_duration_secs("CACHE_DEFAULT_TTL", builder.default_ttl),
            ttl_player_stats: parse_env_duration_secs("CACHE_PLAYER_STATS_TTL", steam_api_ttl),
            ttl_player_summary: parse_env_duration_secs(
                "CACHE_PLAYER_SUMMARY_TTL",
                builder.ttl_player_summary,
            ),
            ttl_achievements: parse_env_duration_secs(
                "CACHE_PLAYER_ACHIEVEMENTS_TTL",
                builder.ttl_achievements,
            ),
            ttl_combined: parse_env_duration_secs(
                "CACHE_PLAYER_COMBINED_TTL",
                builder.ttl_combined,
            ),
            cleanup_interval,
            corruption_mode: builder.corruption_mode,
            deep_corruption_checks: builder.deep_corruption_checks,
            quarantine_capacity: builder.quarantine_capacity,
            max_age_threshold: builder.max_age_threshold,
            max_serialization_time: builder.max_serialization_time,
            name: builder.name,
        }
    }
}

/// Builder for `CacheConfig`, with defaults baked in.
pub struct CacheConfigBuilder {
    max_entries: usize,
    default_ttl: Duration,
    ttl_player_stats: Duration,
    ttl_player_summary: Duration,
    ttl_achievements: Duration,
    ttl_combined: Duration,
    cleanup_interval: Duration,
    corruption_mode: CorruptionMode,
    deep_corruption_checks: bool,
    quarantine_capacity: usize,
    max_age_threshold: Duration,
    max_serialization_time: Duration,
    name: String,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_entries: 10_000,
            default_ttl: Duration::from_secs(300),
            ttl_player_stats: Duration::from_secs(300),
            ttl_player_summary: Duration::from_secs(300),
            ttl_achievements: Duration::from_secs(600),
            ttl_combined: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(30),
            corruption_mode: CorruptionMode::Quarantine,
            deep_corruption_checks: false,
            quarantine_capacity: 100,
            max_age_threshold: Duration::from_secs(365 * 24 * 3600),
            max_serialization_time: Duration::from_millis(10),
            name: "<unnamed>".to_string(),
        }
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn corruption_mode(mut self, mode: CorruptionMode) -> Self {
        self.corruption_mode = mode;
        self
    }

    pub fn deep_corruption_checks(mut self, enabled: bool) -> Self {
        self.deep_corruption_checks = enabled;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> CacheConfig {
        let max_entries = clamp_with_warning("max_entries", self.max_entries, 1, 100_000);
        let cleanup_interval = if self.cleanup_interval < Duration::from_secs(10) {
            tracing::warn!("cleanup_interval below 10s minimum, clamping");
            Duration::from_secs(10)
        } else {
            self.cleanup_interval
        };
        CacheConfig {
            max_entries,
            default_ttl: self.default_ttl,
            ttl_player_stats: self.ttl_player_stats,
            ttl_player_summary: self.ttl_player_summary,
            ttl_achievements: self.ttl_achievements,
            ttl_combined: self.ttl_combined,
            cleanup_interval,
            corruption_mode: self.corruption_mode,
            deep_corruption_checks: self.deep_corruption_checks,
            quarantine_capacity: self.quarantine_capacity,
            max_age_threshold: self.max_age_threshold,
            max_serialization_time: self.max_serialization_time,
            name: self.name,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_entries_is_clamped_to_upper_bound() {
        let config = CacheConfigBuilder::new().max_entries(500_000).build();
        assert_eq!(config.max_entries, 100_000);
    }

    #[test]
    fn max_entries_is_clamped_to_lower_bound() {
        let config = CacheConfigBuilder::new().max_entries(0).build();
        assert_eq!(config.max_entries, 1);
    }

    #[test]
    fn cleanup_interval_below_minimum_is_raised() {
        let config = CacheConfigBuilder::new()
            .cleanup_interval(Duration::from_secs(1))
            .build();
        assert_eq!(config.cleanup_interval, Duration::from_secs(10));
    }

    #[test]
    fn ttl_for_class_uses_configured_value() {
        let config = CacheConfigBuilder::new().build();
        assert_eq!(config.ttl_for(KeyClass::Achievements), config.ttl_achievements);
    }
}
