use serde::Serialize;
use statsgate_cache::Cache;
use statsgate_circuitbreaker::StaleSource;

/// Bridges `statsgate_cache::Cache<V>` to `statsgate_circuitbreaker`'s
/// `StaleSource<V>`. Neither crate can implement the other's trait for the
/// other's type directly (both are foreign to each other), so this
/// newtype, owned by the orchestrator which already depends on both,
/// closes the loop.
pub struct CacheStaleSource<'a, V>(pub &'a Cache<V>);

impl<'a, V: Clone + Serialize> StaleSource<V> for CacheStaleSource<'a, V> {
    fn get_stale(&self, key: &str) -> Option<V> {
        self.0.get_stale(key)
    }
}
