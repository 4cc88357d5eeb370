//! Bounded retry policy shared by every outbound fetch.

use socialkyc_utils::backoff_delay;
use std::time::Duration;

/// How many times to try an outbound call and how long to wait in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, min_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            min_backoff,
            max_backoff,
        }
    }

    /// Policy for page scrapes: a handful of quick attempts.
    pub const fn scraping() -> Self {
        Self::new(3, Duration::from_millis(500), Duration::from_secs(2))
    }

    /// Policy for background refreshes, which can afford to wait longer.
    pub const fn background() -> Self {
        Self::new(10, Duration::from_secs(1), Duration::from_secs(10))
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        backoff_delay(retry, self.min_backoff, self.max_backoff)
    }

    /// Attempt count with the "at least once" floor applied.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::scraping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_stay_within_bounds() {
        let policy = RetryPolicy::scraping();
        for retry in 0..10 {
            let delay = policy.delay(retry);
            assert!(delay >= policy.min_backoff);
            assert!(delay <= policy.max_backoff);
        }
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }
}
