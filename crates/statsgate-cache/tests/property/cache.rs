//! Invariant 1: for all interleavings of `set`/`get`/`delete`, cache
//! `memory_usage >= 0` and `entries <= max_entries`.

use proptest::prelude::*;
use statsgate_cache::{Cache, CacheConfigBuilder};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Set(String, u32),
    Get(String),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = "k[0-4]";
    prop_oneof![
        (key, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        key.prop_map(Op::Get),
        key.prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn memory_and_entries_stay_bounded(ops in proptest::collection::vec(op_strategy(), 0..100)) {
        const MAX_ENTRIES: usize = 8;
        let cache: Cache<u32> = Cache::new(CacheConfigBuilder::new().max_entries(MAX_ENTRIES).build());

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    let _ = cache.set(&key, value, Duration::from_secs(60));
                }
                Op::Get(key) => {
                    let _ = cache.get(&key);
                }
                Op::Delete(key) => {
                    cache.delete(&key);
                }
            }

            let stats = cache.stats();
            prop_assert!(stats.entries <= MAX_ENTRIES);
            // memory_usage is an unsigned byte estimate; the invariant this
            // checks is that eviction bookkeeping never underflows into a
            // huge wrapped value.
            prop_assert!(stats.memory_usage < usize::MAX / 2);
        }
    }
}
