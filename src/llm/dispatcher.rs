//! Rate-Limited Dispatcher
//!
//! Sends a page's text to the model in bounded chunks. Any chunk failure retires the
//! attempt's credential, waits out an exponential backoff and retries the whole call
//! from the first chunk, up to the policy's attempt ceiling.

use crate::config::LlmConfig;
use crate::llm::endpoint::{LlmEndpoint, LlmError};
use crate::llm::rotator::{CredentialError, CredentialRotator};
use crate::llm::text::{chunk_text, is_no_content, strip_leading_phrase};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Credential rotation failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("Credential task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Attempt ceiling and backoff curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based)
    ///
    /// `multiplier * 2^(attempt - 1)`, clamped to `[min_delay, max_delay]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.multiplier.saturating_mul(1u32 << exponent);
        raw.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(30),
            min_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            multiplier: Duration::from_secs(config.backoff_multiplier_secs),
            min_delay: Duration::from_secs(config.backoff_min_secs),
            max_delay: Duration::from_secs(config.backoff_max_secs),
        }
    }
}

/// What the model made of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Extracted content with boilerplate stripped
    Content(String),
    /// The model reported nothing extractable
    NoContent,
}

/// A finished dispatch and the attempts it consumed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub outcome: DispatchOutcome,
    pub attempts: u32,
}

pub struct Dispatcher {
    endpoint: Arc<dyn LlmEndpoint>,
    rotator: Arc<CredentialRotator>,
    policy: RetryPolicy,
    chunk_size: usize,
}

impl Dispatcher {
    pub fn new(
        endpoint: Arc<dyn LlmEndpoint>,
        rotator: Arc<CredentialRotator>,
        policy: RetryPolicy,
        chunk_size: usize,
    ) -> Self {
        Self {
            endpoint,
            rotator,
            policy,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Extracts press content from `text`, fetched from `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatched)` - Content or the no-content sentinel, with the attempt count
    /// * `Err(DispatchError::RetriesExhausted)` - Every attempt failed
    /// * `Err(DispatchError::Credential)` - The pool is empty or could not be persisted
    pub async fn dispatch(&self, text: &str, url: &str) -> Result<Dispatched, DispatchError> {
        let chunks = chunk_text(text, self.chunk_size);
        if chunks.is_empty() {
            tracing::debug!("No text to dispatch for {}", url);
            return Ok(Dispatched {
                outcome: DispatchOutcome::NoContent,
                attempts: 0,
            });
        }

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            let key = self.with_rotator(|rotator| rotator.next_key()).await?;

            match self.run_chunks(&chunks, &key, url).await {
                Ok(combined) => {
                    tracing::info!(
                        "Dispatched {} ({} chunks) on attempt {}",
                        url,
                        chunks.len(),
                        attempt
                    );
                    let outcome = if is_no_content(&combined) {
                        DispatchOutcome::NoContent
                    } else {
                        DispatchOutcome::Content(combined)
                    };
                    return Ok(Dispatched {
                        outcome,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    if e.is_rate_limit() {
                        tracing::warn!("Rate limited on attempt {} for URL {}", attempt, url);
                    } else {
                        tracing::error!("Error on attempt {} for URL {}: {}", attempt, url, e);
                    }
                    let used = key.clone();
                    self.with_rotator(move |rotator| rotator.mark_used(&used))
                        .await?;
                    last_error = e.to_string();

                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.delay(attempt);
                        tracing::info!("Retrying {} in {:?}", url, delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(DispatchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    /// Runs a rotator operation on the blocking pool, since every mutation saves to the
    /// credential store
    async fn with_rotator<T, F>(&self, op: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&CredentialRotator) -> Result<T, CredentialError> + Send + 'static,
        T: Send + 'static,
    {
        let rotator = Arc::clone(&self.rotator);
        let result = tokio::task::spawn_blocking(move || op(&rotator)).await?;
        Ok(result?)
    }

    /// Sends every chunk with `key`, stopping at the first failure
    async fn run_chunks(&self, chunks: &[&str], key: &str, url: &str) -> Result<String, LlmError> {
        let mut results = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Processing chunk {}/{} for {}", index + 1, chunks.len(), url);
            let reply = self.endpoint.complete(chunk, key).await?;
            results.push(strip_leading_phrase(&reply));
        }

        Ok(strip_leading_phrase(&results.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyPartition, MemoryCredentialStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then answers with a numbered reply per call
    struct ScriptedEndpoint {
        failures: Mutex<usize>,
        calls: Mutex<Vec<(usize, String)>>,
        reply: Option<String>,
    }

    impl ScriptedEndpoint {
        fn new(failures: usize) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(Vec::new()),
                reply: None,
            }
        }
    }

    #[async_trait]
    impl LlmEndpoint for ScriptedEndpoint {
        async fn complete(&self, chunk: &str, api_key: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((chunk.chars().count(), api_key.to_string()));

            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(LlmError::RateLimited("429".to_string()));
            }

            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Ok(format!("Here is the content:\n{}", &chunk[..1])),
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            multiplier: Duration::from_millis(1),
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn rotator(n: usize) -> Arc<CredentialRotator> {
        let keys = (0..n).map(|i| format!("gsk_key_number_{}", i)).collect();
        let store = MemoryCredentialStore::new(KeyPartition::new(keys));
        Arc::new(CredentialRotator::new(Box::new(store), 30).unwrap())
    }

    #[test]
    fn test_default_backoff_curve() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(60));
        assert_eq!(policy.delay(2), Duration::from_secs(60));
        assert_eq!(policy.delay(3), Duration::from_secs(120));
        assert_eq!(policy.delay(4), Duration::from_secs(120));
        assert_eq!(policy.delay(40), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_chunks_joined_in_order() {
        let endpoint = Arc::new(ScriptedEndpoint::new(0));
        let dispatcher = Dispatcher::new(endpoint.clone(), rotator(3), fast_policy(), 6000);

        let text = format!("{}{}{}", "a".repeat(6000), "b".repeat(6000), "c".repeat(10));
        let result = dispatcher.dispatch(&text, "https://example.com/news").await.unwrap();

        assert_eq!(result.attempts, 1);
        assert_eq!(result.outcome, DispatchOutcome::Content("a b c".to_string()));

        let calls = endpoint.calls.lock().unwrap();
        let sizes: Vec<usize> = calls.iter().map(|(size, _)| *size).collect();
        assert_eq!(sizes, vec![6000, 6000, 10]);
        assert!(calls.iter().all(|(_, key)| key == &calls[0].1));
    }

    #[tokio::test]
    async fn test_retries_with_rotation() {
        let endpoint = Arc::new(ScriptedEndpoint::new(2));
        let rotator = rotator(3);
        let dispatcher = Dispatcher::new(endpoint.clone(), rotator.clone(), fast_policy(), 6000);

        let text = "x".repeat(15_000);
        let result = dispatcher.dispatch(&text, "https://example.com/news").await.unwrap();

        assert_eq!(result.attempts, 3);
        assert_eq!(result.outcome, DispatchOutcome::Content("x x x".to_string()));

        // Two failed attempts retired two keys
        let partition = rotator.partition();
        assert_eq!(partition.cooling.len(), 2);
        assert_eq!(partition.active.len(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let endpoint = Arc::new(ScriptedEndpoint::new(usize::MAX));
        let dispatcher = Dispatcher::new(endpoint.clone(), rotator(2), fast_policy(), 6000);

        let err = dispatcher
            .dispatch("some page text", "https://example.com/press")
            .await
            .unwrap_err();

        match err {
            DispatchError::RetriesExhausted { attempts, url, .. } => {
                assert_eq!(attempts, 5);
                assert_eq!(url, "https://example.com/press");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(endpoint.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_sentinel_is_no_content() {
        let mut endpoint = ScriptedEndpoint::new(0);
        endpoint.reply = Some("NO PRESS RELEASE CONTENT".to_string());
        let dispatcher = Dispatcher::new(Arc::new(endpoint), rotator(1), fast_policy(), 6000);

        let result = dispatcher
            .dispatch("Cookie policy", "https://example.com/news")
            .await
            .unwrap();
        assert_eq!(result.outcome, DispatchOutcome::NoContent);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_empty_text_skips_endpoint() {
        let endpoint = Arc::new(ScriptedEndpoint::new(0));
        let dispatcher = Dispatcher::new(endpoint.clone(), rotator(1), fast_policy(), 6000);

        let result = dispatcher.dispatch("", "https://example.com/news").await.unwrap();
        assert_eq!(result.outcome, DispatchOutcome::NoContent);
        assert!(endpoint.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_pool_is_credential_error() {
        let endpoint = Arc::new(ScriptedEndpoint::new(0));
        let dispatcher = Dispatcher::new(endpoint, rotator(0), fast_policy(), 6000);

        let err = dispatcher
            .dispatch("text", "https://example.com/news")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Credential(CredentialError::NoKeys)));
    }
}
