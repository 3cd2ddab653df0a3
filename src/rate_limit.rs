//! Retry policy with linear backoff.
//!
//! Upstream rate limiting (the archive index's 429s) is handled as an
//! explicit policy object rather than ad-hoc sleep-and-recurse: a bounded
//! number of attempts with a linearly increasing delay between them.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before retry N is `base_delay * N`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// Backoff before the given attempt (1-indexed; attempt 0 never waits).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether another attempt is allowed after `attempt` attempts have run.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
        }
    }
}
