//! Retry policy with exponential backoff for transient fetch failures.

use std::time::Duration;

use rand::Rng;

use crate::config::NetworkConfig;

/// Backoff never grows beyond this multiple of the base delay.
const MAX_BACKOFF_FACTOR: u32 = 32;

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    Retry { delay: Duration, attempt: u32 },
    /// Give up and surface the error.
    GiveUp,
}

/// Bounded retry with exponential backoff and jitter.
///
/// `attempt` numbers are 1-indexed: attempt 1 is the initial request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&NetworkConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            base_delay,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.max_retries, config.retry_backoff())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempt` failed.
    pub fn should_retry(&self, transient: bool, attempt: u32) -> RetryDecision {
        if !transient || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let delay = self.calculate_delay(attempt);
        tracing::debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// `base * 2^(attempt-1)`, capped, plus up to half the base as jitter.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        let factor = (1u32 << exponent).min(MAX_BACKOFF_FACTOR);
        let backoff = self.base_delay.saturating_mul(factor);

        let jitter_cap = self.base_delay.as_millis() as u64 / 2;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_cap)
        };

        backoff + Duration::from_millis(jitter)
    }
}
