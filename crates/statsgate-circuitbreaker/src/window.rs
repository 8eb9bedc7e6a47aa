use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Fixed-time sliding window of call outcomes. Only the time-based mode
/// is kept; count-based windowing is dropped.
pub(crate) struct SlidingWindow {
    duration: Duration,
    records: VecDeque<(Instant, bool)>,
}

impl SlidingWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            records: VecDeque::new(),
        }
    }

    fn prune(&mut self) {
        let now = Instant::now();
        while let Some((ts, _)) = self.records.front() {
            if now.saturating_duration_since(*ts) > self.duration {
                self.records.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record(&mut self, success: bool) {
        self.prune();
        self.records.push_back((Instant::now(), success));
    }

    /// `(window_size, failures)` after pruning stale entries.
    pub fn stats(&mut self) -> (usize, usize) {
        self.prune();
        let failures = self.records.iter().filter(|(_, success)| !success).count();
        (self.records.len(), failures)
    }

    pub fn failure_rate(&mut self) -> f64 {
        let (size, failures) = self.stats();
        if size == 0 {
            0.0
        } else {
            failures as f64 / size as f64
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_has_zero_rate() {
        let mut window = SlidingWindow::new(Duration::from_secs(60));
        assert_eq!(window.failure_rate(), 0.0);
    }

    #[test]
    fn failure_rate_reflects_recorded_outcomes() {
        let mut window = SlidingWindow::new(Duration::from_secs(60));
        window.record(true);
        window.record(false);
        window.record(false);
        assert_eq!(window.failure_rate(), 2.0 / 3.0);
    }

    #[test]
    fn prune_drops_entries_older_than_window() {
        let mut window = SlidingWindow::new(Duration::from_millis(20));
        window.record(false);
        std::thread::sleep(Duration::from_millis(40));
        let (size, _) = window.stats();
        assert_eq!(size, 0);
    }
}
