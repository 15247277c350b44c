//! Bounded retry with exponential backoff for transient download failures.
//!
//! ```text
//! delay(n) = min(base_delay * 2^(n-1), max_delay)     n = 1, 2, ... max_retries
//! ```
//!
//! Only errors for which [`FetchError::is_transient`] holds are retried.

use std::time::Duration;

use super::FetchError;

/// How many extra attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first. `0` means a single attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether to try again after `error`, given `retries_done` retries so far.
    pub fn should_retry(&self, error: &FetchError, retries_done: u32) -> bool {
        retries_done < self.max_retries && error.is_transient()
    }
}
