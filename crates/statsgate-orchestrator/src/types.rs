use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Minimum upstream achievements contract: treated as an external
/// collaborator, consumed only through these fields.
/// `mapped_achievements` is passed through opaquely since its element
/// shape is not part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementsPayload {
    pub mapped_achievements: Vec<serde_json::Value>,
    pub adept_survivors: HashMap<String, bool>,
    pub adept_killers: HashMap<String, bool>,
    pub summary: AchievementSummary,
    pub last_updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AchievementSummary {
    pub total: u64,
    pub unlocked: u64,
}

impl AchievementsPayload {
    /// An empty, well-formed collection stamped with the current time,
    /// used so `achievements` is never null on any exit path.
    pub fn empty(now: SystemTime) -> Self {
        Self {
            mapped_achievements: Vec::new(),
            adept_survivors: HashMap::new(),
            adept_killers: HashMap::new(),
            summary: AchievementSummary::default(),
            last_updated: now
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.adept_survivors.is_empty() && self.adept_killers.is_empty()
    }
}

/// Where a piece of `FetchResult` data actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
    Unavailable,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Cache => "cache",
            DataSource::Unavailable => "unavailable",
        }
    }
}

/// Per-field fetch diagnostics surfaced in the ingress response under
/// `sources{stats?, achievements?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDiagnostic {
    pub success: bool,
    pub error: Option<String>,
}

impl SourceDiagnostic {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSources {
    pub stats: SourceDiagnostic,
    pub achievements: SourceDiagnostic,
}

/// `FetchResult`. `achievements` is guaranteed non-null;
/// on total achievements failure it is substituted with an empty,
/// current-timestamped collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub stats: Option<serde_json::Value>,
    pub achievements: AchievementsPayload,
    pub stats_error: Option<String>,
    pub ach_error: Option<String>,
    pub stats_source: DataSource,
    pub ach_source: DataSource,
    pub data_sources: DataSources,
}
