use std::time::Duration;

use crate::llm::provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
use crate::utils::error::ParrotyError;

/// Configuration for retry behavior on transient failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based), doubling each time.
    ///
    /// A server-provided `Retry-After` replaces the computed delay. Both are
    /// capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.max_delay_ms);
        if let Some(hint) = retry_after {
            return hint.min(cap);
        }
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor)).min(cap)
    }
}

/// The model handle every generation operation borrows.
///
/// Built once per process; there is no global instance.
pub struct LLMClient {
    provider: Box<dyn LLMProvider>,
    retry_config: RetryConfig,
    options: CompletionOptions,
}

impl LLMClient {
    pub fn new(provider: Box<dyn LLMProvider>) -> Self {
        Self {
            provider,
            retry_config: RetryConfig::default(),
            options: CompletionOptions::default(),
        }
    }

    /// Create a new `LLMClient` with custom retry configuration.
    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Default completion options used by [`LLMClient::prompt`].
    #[must_use]
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Complete a conversation, retrying rate-limit and network failures.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ParrotyError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.complete(messages, options).await {
                Ok(response) => {
                    tracing::debug!(
                        provider = self.provider.name(),
                        model = self.provider.model(),
                        prompt_tokens = response.prompt_tokens,
                        completion_tokens = response.completion_tokens,
                        "completion succeeded"
                    );
                    return Ok(response);
                }
                Err(err) if err.is_transient() && attempt < self.retry_config.max_retries => {
                    attempt = attempt.saturating_add(1);
                    let retry_after = match &err {
                        ParrotyError::RateLimited { retry_after, .. } => *retry_after,
                        _ => None,
                    };
                    let delay = self.retry_config.delay_for(attempt, retry_after);
                    tracing::warn!(
                        "{err}; retrying in {}ms (attempt {attempt}/{})",
                        delay.as_millis(),
                        self.retry_config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send a system instruction and one user prompt with the client's
    /// default options and return the raw text.
    pub async fn prompt(&self, system: &str, prompt: &str) -> Result<String, ParrotyError> {
        let messages = [Message::system(system), Message::user(prompt)];
        let response = self.complete(&messages, &self.options).await?;
        Ok(response.content)
    }

    /// Get the model name from the provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Get the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

impl std::fmt::Debug for LLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("retry_config", &self.retry_config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays a scripted sequence of results.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<CompletionResponse, ParrotyError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(mut script: Vec<Result<CompletionResponse, ParrotyError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ParrotyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ParrotyError::Config("script exhausted".to_owned())))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    fn ok(text: &str) -> Result<CompletionResponse, ParrotyError> {
        Ok(CompletionResponse {
            content: text.to_owned(),
            prompt_tokens: 1,
            completion_tokens: 1,
        })
    }

    fn network_error() -> Result<CompletionResponse, ParrotyError> {
        Err(ParrotyError::NetworkError {
            message: "connection reset".to_owned(),
            source: None,
        })
    }

    fn fast_retries(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30000);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(1, None), Duration::from_millis(1000));
        assert_eq!(config.delay_for(2, None), Duration::from_millis(2000));
        assert_eq!(config.delay_for(3, None), Duration::from_millis(4000));
        assert_eq!(config.delay_for(10, None), Duration::from_millis(30000));
    }

    #[test]
    fn test_retry_after_hint_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(
            config.delay_for(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            config.delay_for(1, Some(Duration::from_secs(600))),
            Duration::from_millis(30000)
        );
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let provider = ScriptedProvider::new(vec![network_error(), ok("done")]);
        let client = LLMClient::new(Box::new(provider)).with_retry_config(fast_retries(3));

        let text = client.prompt("Be brief", "hi").await.unwrap();
        assert_eq!(text, "done");
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let provider = ScriptedProvider::new(vec![
            network_error(),
            network_error(),
            network_error(),
            ok("too late"),
        ]);
        let client = LLMClient::new(Box::new(provider)).with_retry_config(fast_retries(2));

        let err = client.prompt("Be brief", "hi").await.unwrap_err();
        assert!(matches!(err, ParrotyError::NetworkError { .. }));
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(ParrotyError::Provider {
                provider: "scripted".to_owned(),
                message: "INVALID_ARGUMENT".to_owned(),
            }),
            ok("unreachable"),
        ]);
        let client = LLMClient::new(Box::new(provider)).with_retry_config(fast_retries(3));

        let err = client.prompt("Be brief", "hi").await.unwrap_err();
        assert!(matches!(err, ParrotyError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_call_count_includes_retries() {
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![
            Err(ParrotyError::RateLimited {
                provider: "scripted".to_owned(),
                retry_after: Some(Duration::from_millis(1)),
            }),
            ok("ok"),
        ]));

        struct Shared(std::sync::Arc<ScriptedProvider>);

        #[async_trait]
        impl LLMProvider for Shared {
            async fn complete(
                &self,
                messages: &[Message],
                options: &CompletionOptions,
            ) -> Result<CompletionResponse, ParrotyError> {
                self.0.complete(messages, options).await
            }

            fn name(&self) -> &'static str {
                self.0.name()
            }

            fn model(&self) -> &str {
                self.0.model()
            }
        }

        let client = LLMClient::new(Box::new(Shared(std::sync::Arc::clone(&provider))))
            .with_retry_config(fast_retries(3));
        client.prompt("Be brief", "hi").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
