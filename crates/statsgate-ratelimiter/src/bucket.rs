use std::time::{Duration, Instant};

/// Per-client token bucket with full-window (not continuous) refill:
/// once the window elapses, the bucket resets to full rather than
/// trickling tokens back in continuously.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    tokens: usize,
    last_refill: Instant,
}

impl TokenBucket {
    /// First sighting of a client: bucket starts full, minus the token this
    /// call consumes.
    pub(crate) fn new(max_reqs: usize, now: Instant) -> Self {
        Self {
            tokens: max_reqs.saturating_sub(1),
            last_refill: now,
        }
    }

    /// Refills to full capacity if a whole `refresh_window` has elapsed
    /// since the last refill, then admits iff a token remains.
    pub(crate) fn try_acquire(&mut self, max_reqs: usize, refresh_window: Duration, now: Instant) -> bool {
        if now.duration_since(self.last_refill) >= refresh_window {
            self.tokens = max_reqs;
            self.last_refill = now;
        }
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.tokens
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_refill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_consumes_a_token_and_admits() {
        let bucket = TokenBucket::new(5, Instant::now());
        assert_eq!(bucket.remaining(), 4);
    }

    #[test]
    fn exhausts_then_refills_after_a_full_window() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(2, now);
        assert!(bucket.try_acquire(2, Duration::from_millis(50), now));
        assert!(!bucket.try_acquire(2, Duration::from_millis(50), now));

        let later = now + Duration::from_millis(60);
        assert!(bucket.try_acquire(2, Duration::from_millis(50), later));
        assert_eq!(bucket.remaining(), 1);
    }

    #[test]
    fn partial_window_does_not_refill() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(1, now);
        let soon = now + Duration::from_millis(10);
        assert!(!bucket.try_acquire(1, Duration::from_secs(1), soon));
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Invariant 8: over any window of length <= refresh_window, a
        /// bucket admits at most `capacity` requests.
        #[test]
        fn admits_at_most_capacity_within_one_window(
            capacity in 1usize..10,
            window_ms in 10u64..200,
            offsets in proptest::collection::vec(0u64..199, 0..50),
        ) {
            let mut offsets: Vec<u64> = offsets.into_iter().filter(|&o| o < window_ms).collect();
            offsets.sort_unstable();

            let base = Instant::now();
            let window = Duration::from_millis(window_ms);
            let mut bucket = TokenBucket::new(capacity, base);
            let mut admitted = 1usize; // `new` consumes a token for its own call

            for offset in offsets {
                let now = base + Duration::from_millis(offset);
                if bucket.try_acquire(capacity, window, now) {
                    admitted += 1;
                }
            }

            prop_assert!(admitted <= capacity);
        }
    }
}
