use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::config::OrchestratorConfig;
use crate::types::AchievementsPayload;

/// failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("new achievement data is absent")]
    NilResponse,
    #[error("new achievement data failed validation: {reason}")]
    ValidationFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: AchievementsPayload,
    pub changes: usize,
}

/// `safe_merge(existing_bundle, new_achievements, player_id)`.
///
/// Validates the incoming data, rejects a staler-than-existing update as
/// a no-op, then additively merges per-character unlock state.
pub fn safe_merge(
    existing: &AchievementsPayload,
    new: Option<&AchievementsPayload>,
    _player_id: &str,
    config: &OrchestratorConfig,
    now: SystemTime,
) -> Result<MergeOutcome, MergeError> {
    let new = new.ok_or(MergeError::NilResponse)?;

    validate(new, config, now)?;

    if existing.last_updated != 0 && new.last_updated != 0 && new.last_updated < existing.last_updated {
        return Ok(MergeOutcome {
            merged: existing.clone(),
            changes: 0,
        });
    }

    let mut merged = existing.clone();
    let mut changes = 0usize;

    // Unlocks are permanent: a character already `true` never flips back
    // to `false` just because a later fetch observed it unset, so each
    // character's merged value is the OR of what we already had and
    // what the new payload reports.
    for (character, unlocked) in &new.adept_survivors {
        let merged_value = merged.adept_survivors.get(character).copied().unwrap_or(false) || *unlocked;
        if merged.adept_survivors.get(character) != Some(&merged_value) {
            merged.adept_survivors.insert(character.clone(), merged_value);
            changes += 1;
        }
    }
    for (character, unlocked) in &new.adept_killers {
        let merged_value = merged.adept_killers.get(character).copied().unwrap_or(false) || *unlocked;
        if merged.adept_killers.get(character) != Some(&merged_value) {
            merged.adept_killers.insert(character.clone(), merged_value);
            changes += 1;
        }
    }

    if !new.mapped_achievements.is_empty() {
        merged.mapped_achievements = new.mapped_achievements.clone();
    }
    merged.summary = new.summary.clone();
    merged.last_updated = new.last_updated;

    Ok(MergeOutcome { merged, changes })
}

fn validate(new: &AchievementsPayload, config: &OrchestratorConfig, now: SystemTime) -> Result<(), MergeError> {
    if new.adept_survivors.len() < config.min_valid_survivors {
        return Err(MergeError::ValidationFailed {
            reason: format!(
                "survivor subset size {} below minimum {}",
                new.adept_survivors.len(),
                config.min_valid_survivors
            ),
        });
    }
    if new.adept_killers.len() < config.min_valid_killers {
        return Err(MergeError::ValidationFailed {
            reason: format!(
                "killer subset size {} below minimum {}",
                new.adept_killers.len(),
                config.min_valid_killers
            ),
        });
    }

    let now_secs = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
    let age = now_secs.saturating_sub(new.last_updated);
    if age > config.max_age_threshold.as_secs() {
        return Err(MergeError::ValidationFailed {
            reason: format!("last_updated is {age}s old, exceeds max_age_threshold"),
        });
    }

    for character in new.adept_survivors.keys().chain(new.adept_killers.keys()) {
        let len = character.len();
        if len == 0 || len > 50 {
            return Err(MergeError::ValidationFailed {
                reason: format!("character name '{character}' has invalid length {len}"),
            });
        }
    }

    Ok(())
}
