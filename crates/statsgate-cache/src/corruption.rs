//! Corruption detection and recovery.
//!
//! Rust's `Instant` has no representable "null"/"zero" value and there are
//! no null pointers to a heap entry, so the two null-pointer/zero-instant
//! checks lists for languages with nullable timestamps collapse
//! here into the skew checks below, which are the only ones that can
//! actually occur in this type system.

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    StaleBeyondMaxAge,
    AccessedInFuture,
    ZeroSize,
    SerializationFailed,
    SerializationTooSlow,
    KeyTooLong,
    EmptyKey,
    SizeMismatch,
}

/// Runs the configured corruption checks against one entry. Returns the
/// first violated invariant, if any.
pub fn detect<V: Serialize>(
    key: &str,
    entry: &CacheEntry<V>,
    config: &CacheConfig,
) -> Option<CorruptionKind> {
    let now = Instant::now();

    if now.saturating_duration_since(entry.accessed_at) > config.max_age_threshold {
        return Some(CorruptionKind::StaleBeyondMaxAge);
    }
    if entry.accessed_at.saturating_duration_since(now) > Duration::from_secs(60) {
        return Some(CorruptionKind::AccessedInFuture);
    }
    if entry.size == 0 {
        return Some(CorruptionKind::ZeroSize);
    }

    let serialize_started = Instant::now();
    let serialized = serde_json::to_vec(&entry.value);
    let elapsed = serialize_started.elapsed();
    let Ok(bytes) = serialized else {
        return Some(CorruptionKind::SerializationFailed);
    };
    if elapsed > config.max_serialization_time {
        return Some(CorruptionKind::SerializationTooSlow);
    }

    if config.deep_corruption_checks {
        if key.is_empty() {
            return Some(CorruptionKind::EmptyKey);
        }
        if key.len() > 1000 {
            return Some(CorruptionKind::KeyTooLong);
        }
        let computed = bytes.len();
        let stored = entry.size as f64;
        let diff_ratio = ((computed as f64) - stored).abs() / stored.max(1.0);
        if diff_ratio > 0.5 {
            return Some(CorruptionKind::SizeMismatch);
        }
    }

    None
}

/// Outcome of an attempt-recover pass.
pub enum RecoveryOutcome {
    Recovered,
    Unrecoverable,
}

/// Targeted repair for the corruption classes that can be fixed in place.
/// Anything else falls through to purge at the call site.
pub fn attempt_recover<V: Serialize>(
    kind: CorruptionKind,
    entry: &mut CacheEntry<V>,
) -> RecoveryOutcome {
    match kind {
        CorruptionKind::AccessedInFuture => {
            entry.accessed_at = Instant::now();
            RecoveryOutcome::Recovered
        }
        CorruptionKind::ZeroSize => {
            if let Ok(bytes) = serde_json::to_vec(&entry.value) {
                entry.size = bytes.len().max(1);
                RecoveryOutcome::Recovered
            } else {
                RecoveryOutcome::Unrecoverable
            }
        }
        CorruptionKind::SizeMismatch => {
            if let Ok(bytes) = serde_json::to_vec(&entry.value) {
                entry.size = bytes.len().max(1);
                RecoveryOutcome::Recovered
            } else {
                RecoveryOutcome::Unrecoverable
            }
        }
        CorruptionKind::StaleBeyondMaxAge => {
            // Not the same defect as an expired-but-recently-accessed entry,
            // but the same fix applies: extend the TTL by 5 minutes.
            entry.expires_at = Instant::now() + Duration::from_secs(5 * 60);
            RecoveryOutcome::Recovered
        }
        CorruptionKind::SerializationFailed
        | CorruptionKind::SerializationTooSlow
        | CorruptionKind::KeyTooLong
        | CorruptionKind::EmptyKey => RecoveryOutcome::Unrecoverable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfigBuilder;

    #[test]
    fn fresh_entry_is_not_corrupt() {
        let config = CacheConfigBuilder::new().build();
        let entry = CacheEntry::new(42u32, Duration::from_secs(60), 4);
        assert!(detect("k", &entry, &config).is_none());
    }

    #[test]
    fn zero_size_is_detected() {
        let config = CacheConfigBuilder::new().build();
        let mut entry = CacheEntry::new(42u32, Duration::from_secs(60), 4);
        entry.size = 0;
        assert_eq!(detect("k", &entry, &config), Some(CorruptionKind::ZeroSize));
    }

    #[test]
    fn future_accessed_at_is_detected_and_recoverable() {
        let config = CacheConfigBuilder::new().build();
        let mut entry = CacheEntry::new(42u32, Duration::from_secs(60), 4);
        entry.accessed_at = Instant::now() + Duration::from_secs(120);
        let kind = detect("k", &entry, &config).unwrap();
        assert_eq!(kind, CorruptionKind::AccessedInFuture);
        assert!(matches!(
            attempt_recover(kind, &mut entry),
            RecoveryOutcome::Recovered
        ));
        assert!(entry.accessed_at <= Instant::now());
    }

    #[test]
    fn deep_mode_rejects_empty_key() {
        let config = CacheConfigBuilder::new().deep_corruption_checks(true).build();
        let entry = CacheEntry::new(42u32, Duration::from_secs(60), 4);
        assert_eq!(detect("", &entry, &config), Some(CorruptionKind::EmptyKey));
    }
}
