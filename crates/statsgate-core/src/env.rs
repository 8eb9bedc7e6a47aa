//! Shared environment-variable parsing helpers.
//!
//! Every component's config loader uses these so that "invalid values are
//! rejected with a warning and replaced by built-in defaults" is
//! applied consistently instead of being reimplemented five times.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Reads `key` from the environment and parses it with `FromStr`, falling
/// back to `default` and logging a warning on missing/invalid input.
pub fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + Display,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, raw, error = %err, default = %default, "invalid env value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Reads `key` as a whole-number count of seconds, falling back to `default`.
pub fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(err) => {
                tracing::warn!(key, raw, error = %err, "invalid duration env value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Clamps `value` into `range`, logging a warning if clamping changed it.
pub fn clamp_with_warning<T>(field: &str, value: T, min: T, max: T) -> T
where
    T: PartialOrd + Display + Copy,
{
    if value < min {
        tracing::warn!(field, %value, clamped_to = %min, "value below minimum, clamping");
        min
    } else if value > max {
        tracing::warn!(field, %value, clamped_to = %max, "value above maximum, clamping");
        max
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_when_missing() {
        std::env::remove_var("STATSGATE_TEST_MISSING");
        assert_eq!(parse_env("STATSGATE_TEST_MISSING", 42u64), 42);
    }

    #[test]
    fn clamp_within_range_is_unchanged() {
        assert_eq!(clamp_with_warning("x", 5, 1, 10), 5);
    }

    #[test]
    fn clamp_below_min_is_raised() {
        assert_eq!(clamp_with_warning("x", 0, 1, 10), 1);
    }

    #[test]
    fn clamp_above_max_is_lowered() {
        assert_eq!(clamp_with_warning("x", 100, 1, 10), 10);
    }
}
