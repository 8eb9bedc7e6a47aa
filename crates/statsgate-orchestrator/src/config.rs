use statsgate_core::parse_env_duration_secs;
use std::time::Duration;

/// Timeouts and merge-validation bounds for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub overall_timeout: Duration,
    pub api_timeout: Duration,
    pub achievements_timeout: Duration,
    pub min_valid_survivors: usize,
    pub min_valid_killers: usize,
    pub max_age_threshold: Duration,
    pub name: String,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        let builder = OrchestratorConfigBuilder::new();
        Self {
            overall_timeout: parse_env_duration_secs("OVERALL_TIMEOUT_SECS", builder.overall_timeout),
            api_timeout: parse_env_duration_secs("API_TIMEOUT_SECS", builder.api_timeout),
            achievements_timeout: parse_env_duration_secs(
                "ACHIEVEMENTS_TIMEOUT_SECS",
                builder.achievements_timeout,
            ),
            min_valid_survivors: builder.min_valid_survivors,
            min_valid_killers: builder.min_valid_killers,
            max_age_threshold: builder.max_age_threshold,
            name: builder.name,
        }
    }
}

pub struct OrchestratorConfigBuilder {
    overall_timeout: Duration,
    api_timeout: Duration,
    achievements_timeout: Duration,
    min_valid_survivors: usize,
    min_valid_killers: usize,
    max_age_threshold: Duration,
    name: String,
}

impl OrchestratorConfigBuilder {
    pub fn new() -> Self {
        Self {
            overall_timeout: Duration::from_secs(10),
            api_timeout: Duration::from_secs(5),
            achievements_timeout: Duration::from_secs(5),
            min_valid_survivors: 20,
            min_valid_killers: 15,
            max_age_threshold: Duration::from_secs(24 * 3600),
            name: "<unnamed>".to_string(),
        }
    }

    pub fn overall_timeout(mut self, d: Duration) -> Self {
        self.overall_timeout = d;
        self
    }

    pub fn api_timeout(mut self, d: Duration) -> Self {
        self.api_timeout = d;
        self
    }

    pub fn achievements_timeout(mut self, d: Duration) -> Self {
        self.achievements_timeout = d;
        self
    }

    pub fn min_valid_survivors(mut self, n: usize) -> Self {
        self.min_valid_survivors = n;
        self
    }

    pub fn min_valid_killers(mut self, n: usize) -> Self {
        self.min_valid_killers = n;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> OrchestratorConfig {
        OrchestratorConfig {
            overall_timeout: self.overall_timeout,
            api_timeout: self.api_timeout,
            achievements_timeout: self.achievements_timeout,
            min_valid_survivors: self.min_valid_survivors,
            min_valid_killers: self.min_valid_killers,
            max_age_threshold: self.max_age_threshold,
            name: self.name,
        }
    }
}

impl Default for OrchestratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
