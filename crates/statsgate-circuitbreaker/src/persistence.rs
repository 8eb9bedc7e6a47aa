//! Optional state persistence.
//!
//! Only compiled with the `persistence` feature; callers that don't need
//! cross-restart state don't pay for `serde_json`.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::state::CircuitState;

const MAX_STATE_AGE: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistedState {
    pub state: String,
    pub failures: usize,
    pub last_failure_unix_secs: u64,
    pub open_count: u64,
}

impl PersistedState {
    pub fn capture(state: CircuitState, failures: usize, open_count: u64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            state: state.as_str().to_string(),
            failures,
            last_failure_unix_secs: now,
            open_count,
        }
    }

    fn is_stale(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        now.saturating_sub(self.last_failure_unix_secs) > MAX_STATE_AGE.as_secs()
    }

    pub fn state(&self) -> CircuitState {
        match self.state.as_str() {
            "open" => CircuitState::Open,
            "half_open" => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Atomically writes state via a temp file + rename.
pub async fn save(path: &Path, state: &PersistedState) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    let body = serde_json::to_vec_pretty(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Loads persisted state, discarding (returning `None` for) anything older
/// than 24h.
pub async fn load(path: &Path) -> Option<PersistedState> {
    let body = tokio::fs::read(path).await.ok()?;
    let parsed: PersistedState = serde_json::from_slice(&body).ok()?;
    if parsed.is_stale() {
        tracing::warn!(path = %path.display(), "discarding circuit breaker state older than 24h");
        None
    } else {
        Some(parsed)
    }
}
