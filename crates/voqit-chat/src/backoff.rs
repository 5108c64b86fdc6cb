//! Rate-limit backoff policy.
//!
//! `BackoffPolicy::decide` is a pure function of the attempt index and the
//! attempt's outcome. Only rate-limit responses are retried; the delay before
//! retry `n` (0-based) is `base_delay * 2^n`.

use std::time::Duration;

use async_trait::async_trait;
use voqit_core::config::RetryConfig;

use crate::error::{CompletionError, TransportError};

/// Result of one attempt, stripped down to what the policy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T> {
    Success(T),
    RateLimited,
    Failed(String),
}

impl<T> From<Result<T, TransportError>> for AttemptOutcome<T> {
    fn from(result: Result<T, TransportError>) -> Self {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(TransportError::RateLimited) => AttemptOutcome::RateLimited,
            Err(other) => AttemptOutcome::Failed(other.to_string()),
        }
    }
}

/// What the caller should do after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision<T> {
    Succeed(T),
    Retry(Duration),
    Fail(CompletionError),
}

/// Bounded exponential backoff for rate-limited completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl BackoffPolicy {
    /// `max_attempts` counts the first attempt and is at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after attempt `attempt` (0-based) was rate limited.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide what to do after attempt `attempt` (0-based) produced `outcome`.
    pub fn decide<T>(&self, attempt: u32, outcome: AttemptOutcome<T>) -> RetryDecision<T> {
        match outcome {
            AttemptOutcome::Success(value) => RetryDecision::Succeed(value),
            AttemptOutcome::Failed(reason) => {
                RetryDecision::Fail(CompletionError::RequestFailed(reason))
            }
            AttemptOutcome::RateLimited if attempt + 1 < self.max_attempts => {
                RetryDecision::Retry(self.delay(attempt))
            }
            AttemptOutcome::RateLimited => RetryDecision::Fail(CompletionError::RateLimited {
                attempts: attempt + 1,
            }),
        }
    }
}

/// Suspends the pipeline between retries.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `Sleeper` backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_doubles() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(2000));
        assert_eq!(policy.delay(1), Duration::from_millis(4000));
        assert_eq!(policy.delay(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = BackoffPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay(64), Duration::from_secs(1).saturating_mul(u32::MAX));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = BackoffPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(
            policy.decide::<()>(0, AttemptOutcome::RateLimited),
            RetryDecision::Fail(CompletionError::RateLimited { attempts: 1 })
        );
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 250,
        };
        let policy = BackoffPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_rate_limit_schedule() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.decide::<()>(0, AttemptOutcome::RateLimited),
            RetryDecision::Retry(Duration::from_millis(2000))
        );
        assert_eq!(
            policy.decide::<()>(1, AttemptOutcome::RateLimited),
            RetryDecision::Retry(Duration::from_millis(4000))
        );
        assert_eq!(
            policy.decide::<()>(2, AttemptOutcome::RateLimited),
            RetryDecision::Fail(CompletionError::RateLimited { attempts: 3 })
        );
    }

    #[test]
    fn test_other_failure_is_terminal() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.decide::<()>(0, AttemptOutcome::Failed("HTTP 500".to_string())),
            RetryDecision::Fail(CompletionError::RequestFailed("HTTP 500".to_string()))
        );
    }

    #[test]
    fn test_success_passes_value_through() {
        let policy = BackoffPolicy::default();
        assert_eq!(
            policy.decide(1, AttemptOutcome::Success("4")),
            RetryDecision::Succeed("4")
        );
    }

    #[test]
    fn test_outcome_from_transport_result() {
        let ok: AttemptOutcome<String> = Ok("hi".to_string()).into();
        assert_eq!(ok, AttemptOutcome::Success("hi".to_string()));

        let limited: AttemptOutcome<String> = Err(TransportError::RateLimited).into();
        assert_eq!(limited, AttemptOutcome::RateLimited);

        let failed: AttemptOutcome<String> = Err(TransportError::Status {
            status: 503,
            body: String::new(),
        })
        .into();
        assert!(matches!(failed, AttemptOutcome::Failed(msg) if msg.contains("503")));
    }
}
