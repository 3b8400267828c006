//! Exponential backoff around a single provider call.
//!
//! Rate limits and transient outages are retried; permanent and unclassified
//! errors propagate on the first attempt.

use crate::domain::provider::ProviderError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before the retry that follows failed attempt `attempt` (1-based).
    ///
    /// A provider hint replaces the computed delay. Both are capped.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let computed = self
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .unwrap_or(self.max_delay);
        hint.unwrap_or(computed).min(self.max_delay)
    }
}

#[derive(Error, Debug)]
pub enum RetryError {
    #[error("permanent provider failure: {0}")]
    Permanent(ProviderError),
    #[error("provider call failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ProviderError },
    #[error("unexpected provider failure: {0}")]
    Unexpected(ProviderError),
}

/// Runs `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match err {
            ProviderError::Permanent { .. } => return Err(RetryError::Permanent(err)),
            ProviderError::Unexpected(_) => return Err(RetryError::Unexpected(err)),
            ProviderError::RateLimited { .. } | ProviderError::Transient { .. } => {}
        }

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %err, "exhausted retries for provider call");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let wait = policy.delay_for(attempt, err.retry_after());
        tracing::warn!(
            attempt,
            max_attempts,
            error = %err,
            wait_ms = wait.as_millis() as u64,
            "retriable provider error"
        );
        tokio::time::sleep(wait).await;
    }
}
