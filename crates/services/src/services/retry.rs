//! Fixed-interval retry policy for outbound notifications.

use std::time::Duration;

use backon::{BackoffBuilder, ConstantBuilder};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryPolicyError {
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
}

/// How many times a delivery is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_interval: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

    pub fn new(max_attempts: u32, retry_interval: Duration) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            retry_interval,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Backoff for `backon::Retryable`: `max_attempts - 1` retries, each after
    /// the same fixed interval.
    pub fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.retry_interval)
            .with_max_times(self.max_attempts as usize - 1)
    }

    /// The waits between attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        self.backoff().build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_interval: Self::DEFAULT_RETRY_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.retry_interval(), Duration::from_secs(2));
        assert_eq!(
            policy.delays().collect::<Vec<_>>(),
            vec![Duration::from_secs(2), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_delays_are_fixed_not_exponential() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250)).unwrap();
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|d| *d == Duration::from_millis(250)));
    }

    #[test]
    fn test_single_attempt_never_waits() {
        let policy = RetryPolicy::new(1, Duration::from_secs(30)).unwrap();
        assert_eq!(policy.delays().count(), 0);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert_eq!(
            RetryPolicy::new(0, Duration::from_secs(1)),
            Err(RetryPolicyError::ZeroAttempts)
        );
    }
}
