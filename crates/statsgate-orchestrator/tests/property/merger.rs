//! Invariant 6: `safe_merge(safe_merge(b, n), n) == safe_merge(b, n)`.
//! Invariant 7: unlocking is monotone. A character already `true` in
//! `b` stays `true` after merging in any `n`.

use proptest::collection::hash_map;
use proptest::prelude::*;
use statsgate_orchestrator::merger::safe_merge;
use statsgate_orchestrator::types::{AchievementSummary, AchievementsPayload};
use statsgate_orchestrator::OrchestratorConfigBuilder;
use std::time::{SystemTime, UNIX_EPOCH};

fn character() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn unlock_map() -> impl Strategy<Value = std::collections::HashMap<String, bool>> {
    hash_map(character(), any::<bool>(), 0..6)
}

fn payload(survivors: std::collections::HashMap<String, bool>, killers: std::collections::HashMap<String, bool>) -> AchievementsPayload {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    AchievementsPayload {
        mapped_achievements: Vec::new(),
        summary: AchievementSummary {
            total: (survivors.len() + killers.len()) as u64,
            unlocked: survivors.values().filter(|v| **v).count() as u64,
        },
        adept_survivors: survivors,
        adept_killers: killers,
        last_updated: now,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn merge_is_idempotent(
        existing_s in unlock_map(), existing_k in unlock_map(),
        new_s in unlock_map(), new_k in unlock_map(),
    ) {
        let config = OrchestratorConfigBuilder::new()
            .min_valid_survivors(0)
            .min_valid_killers(0)
            .build();
        let existing = payload(existing_s, existing_k);
        let new = payload(new_s, new_k);
        let now = SystemTime::now();

        let once = safe_merge(&existing, Some(&new), "p", &config, now).unwrap().merged;
        let twice = safe_merge(&once, Some(&new), "p", &config, now).unwrap().merged;

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_relocks_a_character(
        existing_s in unlock_map(), existing_k in unlock_map(),
        new_s in unlock_map(), new_k in unlock_map(),
    ) {
        let config = OrchestratorConfigBuilder::new()
            .min_valid_survivors(0)
            .min_valid_killers(0)
            .build();
        let existing = payload(existing_s, existing_k);
        let new = payload(new_s, new_k);
        let now = SystemTime::now();

        let merged = safe_merge(&existing, Some(&new), "p", &config, now).unwrap().merged;

        for (character, unlocked) in existing.adept_survivors.iter().filter(|(_, v)| **v) {
            prop_assert_eq!(merged.adept_survivors.get(character).copied(), Some(*unlocked));
        }
        for (character, unlocked) in existing.adept_killers.iter().filter(|(_, v)| **v) {
            prop_assert_eq!(merged.adept_killers.get(character).copied(), Some(*unlocked));
        }
    }
}
