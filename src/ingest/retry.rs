//! Retry policy for a single page.
//!
//! Attempts are numbered from 1. After a failed attempt the policy decides
//! one of three things: wait and try again, stop because the budget is
//! spent, or stop because the error cannot be fixed by retrying. The delay
//! doubles with every attempt and has no wall-clock cap.

use std::time::Duration;

use super::error::FetchError;
use crate::config::BackoffConfig;

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for `delay`, then make attempt `next_attempt`.
    Retry { delay: Duration, next_attempt: u32 },
    /// Retryable error, but that was the last attempt.
    Exhausted,
    /// Error that another attempt cannot fix.
    NonRetryable,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    backoff: BackoffConfig,
}

impl RetryPolicy {
    pub fn new(backoff: BackoffConfig) -> Self {
        Self { backoff }
    }

    /// Decide the next step after `attempt` (1-based) failed with `error`,
    /// given a budget of `max_attempts`.
    pub fn next_step(&self, error: &FetchError, attempt: u32, max_attempts: u32) -> RetryStep {
        let Some(base) = self.base_delay(error) else {
            return RetryStep::NonRetryable;
        };
        if attempt >= max_attempts.max(1) {
            return RetryStep::Exhausted;
        }
        RetryStep::Retry {
            delay: exponential_delay(base, attempt),
            next_attempt: attempt + 1,
        }
    }

    /// Base delay for a retryable error, `None` otherwise.
    fn base_delay(&self, error: &FetchError) -> Option<Duration> {
        match error {
            FetchError::RateLimited => Some(self.backoff.rate_limit_base),
            FetchError::ServerError(_) => Some(self.backoff.server_error_base),
            FetchError::Transport(_) => Some(self.backoff.transport_base),
            FetchError::HttpError(_)
            | FetchError::MalformedJson(_)
            | FetchError::InvalidResponseShape(_) => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

/// `base * 2^(attempt - 1)`, saturating.
pub fn exponential_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}
