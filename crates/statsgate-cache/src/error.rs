use thiserror::Error;

/// Errors from `set`: it may fail only during shutdown or on invalid
/// inputs. `get` never fails; it returns a value or a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache is shutting down")]
    ShuttingDown,
    #[error("key must not be empty")]
    EmptyKey,
    #[error("value must not be nil")]
    NilValue,
}
