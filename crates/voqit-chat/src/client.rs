//! Completion client: cache lookup, remote call, rate-limit backoff.

use std::sync::Arc;

use voqit_core::types::Question;

use crate::backoff::{AttemptOutcome, BackoffPolicy, RetryDecision, Sleeper, TokioSleeper};
use crate::cache::AnswerCache;
use crate::error::CompletionError;
use crate::transport::CompletionTransport;

/// Resolves a question into an answer, from the cache or the remote endpoint.
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    cache: Arc<AnswerCache>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("policy", &self.policy)
            .field("cached_answers", &self.cache.len())
            .finish()
    }
}

impl CompletionClient {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        cache: Arc<AnswerCache>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            transport,
            cache,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the timer used between retries.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn cache(&self) -> &Arc<AnswerCache> {
        &self.cache
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Answer `question`.
    ///
    /// A cached answer returns without any network call. Otherwise the
    /// endpoint is called at most `max_attempts` times, sleeping between
    /// rate-limited attempts. The cache is written on success only.
    pub async fn complete(&self, question: &str) -> Result<String, CompletionError> {
        let question = Question::parse(question).ok_or(CompletionError::InvalidInput)?;

        if let Some(answer) = self.cache.get(question.as_str()) {
            tracing::debug!(question_len = question.as_str().len(), "Answer cache hit");
            return Ok(answer);
        }

        let mut attempt = 0;
        loop {
            let result = self.transport.generate(question.as_str()).await;

            match self.policy.decide(attempt, AttemptOutcome::from(result)) {
                RetryDecision::Succeed(answer) => {
                    self.cache.set(question.as_str(), &answer);
                    tracing::info!(
                        attempts = attempt + 1,
                        answer_len = answer.len(),
                        "Completion received"
                    );
                    return Ok(answer);
                }
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Completion rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Fail(err) => {
                    tracing::warn!(attempts = attempt + 1, error = %err, "Completion failed");
                    return Err(err);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
