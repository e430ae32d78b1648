//! Exponential backoff policy for request retries.

use std::time::Duration;

/// Default cap on a single backoff delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for retry behavior with exponential backoff.
///
/// The delay after attempt `n` is `base_delay * 2^n`: with the default one
/// second base that is 2s, 4s, 8s and so on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Unit multiplied by `2^attempt`.
    pub base_delay: Duration,
    /// Upper bound for any single delay. `None` leaves the growth unbounded.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Some(DEFAULT_MAX_BACKOFF),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given base and cap.
    pub fn new(base_delay: Duration, max_delay: Option<Duration>) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// A policy without a delay cap.
    pub fn unbounded() -> Self {
        Self {
            max_delay: None,
            ..Self::default()
        }
    }

    /// Calculates the wait after the given (1-based) attempt failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(63);
        let multiplier = 1u64 << exponent;
        let base_millis = self.base_delay.as_millis().min(u64::MAX as u128) as u64;
        let delay = Duration::from_millis(base_millis.saturating_mul(multiplier));

        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Returns true if another attempt is allowed after `attempt` failed.
    pub fn should_retry(&self, attempt: u32, max_attempts: u32) -> bool {
        attempt < max_attempts
    }
}
