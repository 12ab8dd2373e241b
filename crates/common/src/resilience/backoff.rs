//! Exponential backoff schedule
//!
//! The delay for retry `n` (0-based) is `initial_delay * 2^n`, capped at
//! `max_delay`. No jitter is applied: callers that need a predictable
//! schedule (and tests under a paused tokio clock) get exact values.

use std::time::Duration;

use crate::error::{CommonError, CommonResult};

/// Largest exponent applied before saturating
const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Exponential backoff with a bounded number of retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Retries allowed after the initial attempt
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy, rejecting an initial delay above the cap
    pub fn new(initial_delay: Duration, max_delay: Duration, max_retries: u32) -> CommonResult<Self> {
        let policy = Self { initial_delay, max_delay, max_retries };
        policy.validate()?;
        Ok(policy)
    }

    /// Validate the policy
    pub fn validate(&self) -> CommonResult<()> {
        if self.initial_delay > self.max_delay {
            return Err(CommonError::config(format!(
                "initial_delay ({:?}) cannot be greater than max_delay ({:?})",
                self.initial_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Delay to wait after the failed attempt with the given 0-based index
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let multiplier = 2_u32.saturating_pow(exponent);
        self.initial_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// Total number of attempts (initial try plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// The full delay sequence, one entry per attempt
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts()).map(|attempt| self.delay_for(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_from_initial_delay() {
        let policy = BackoffPolicy::default();
        let delays: Vec<_> = policy.schedule().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn caps_at_max_delay() {
        let policy =
            BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(3), 10).unwrap();
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(40), Duration::from_secs(3));
    }

    #[test]
    fn rejects_initial_above_cap() {
        assert!(BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(1), 1).is_err());
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = BackoffPolicy { max_retries: 0, ..BackoffPolicy::default() };
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.schedule().count(), 1);
    }
}
