//! Single-shot generation over a `Provider`, bounded by a timeout.

use docent_core::error::{GenerationError, ProviderError};
use docent_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Prompt in, text out. Stateless; every call is one provider request.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    /// `None` disables the timeout
    timeout: Option<Duration>,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Some(Duration::from_secs(120)),
        }
    }

    /// Build from config: model, temperature, token cap and timeout.
    ///
    /// A `default_model` set under the default provider's section wins over
    /// the top-level one.
    pub fn from_config(provider: Arc<dyn Provider>, config: &docent_config::AppConfig) -> Self {
        let timeout = match config.generation.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            provider,
            model: config.active_model().to_string(),
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            timeout,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate text for `prompt`.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_with_system(None, prompt).await
    }

    /// Generate text for `prompt` under an optional system instruction.
    pub async fn generate_with_system(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut request = ProviderRequest::prompt(&self.model, system, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_len = prompt.len(),
            "Generating"
        );

        let call = self.provider.complete(request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = millis(limit), "Generation timed out");
                    return Err(GenerationError::Timeout {
                        timeout_ms: millis(limit),
                    });
                }
            },
            None => call.await,
        };

        let response = match result {
            Ok(response) => response,
            Err(ProviderError::Timeout(reason)) => {
                warn!(reason = %reason, "Provider transport timed out");
                return Err(GenerationError::Timeout {
                    timeout_ms: self.timeout.map(millis).unwrap_or(0),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let text = response.message.content;
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[tokio::test]
    async fn returns_completion_text() {
        let provider = Arc::new(SequentialMockProvider::single_text("X is a concept."));
        let generator = Generator::new(provider.clone(), "mock-model");

        let text = generator.generate("What is X?").await.unwrap();
        assert_eq!(text, "X is a concept.");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn request_carries_model_and_settings() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let generator = Generator::new(provider.clone(), "mistral")
            .with_temperature(0.3)
            .with_max_tokens(256);

        generator
            .generate_with_system(Some("be brief"), "hello")
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "mistral");
        assert_eq!(request.max_tokens, Some(256));
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "hello");
    }

    #[tokio::test]
    async fn provider_failure_is_backend_error() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::Network("connection refused".into()),
        )]));
        let generator = Generator::new(provider, "mock-model");

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Backend(ProviderError::Network(_))));
    }

    #[tokio::test]
    async fn blank_completion_is_rejected() {
        let provider = Arc::new(SequentialMockProvider::single_text("  \n "));
        let generator = Generator::new(provider, "mock-model");

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let provider = Arc::new(
            SequentialMockProvider::single_text("too late").with_delay(Duration::from_secs(30)),
        );
        let generator =
            Generator::new(provider, "mock-model").with_timeout(Some(Duration::from_secs(5)));

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { timeout_ms: 5_000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_keeps_millisecond_precision() {
        let provider = Arc::new(
            SequentialMockProvider::single_text("too late").with_delay(Duration::from_secs(1)),
        );
        let generator =
            Generator::new(provider, "mock-model").with_timeout(Some(Duration::from_millis(250)));

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { timeout_ms: 250 }));
        assert!(err.to_string().contains("250ms"));
    }

    #[tokio::test]
    async fn transport_timeout_is_reported_as_timeout() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(ProviderError::Timeout(
            "operation timed out".into(),
        ))]));
        let generator =
            Generator::new(provider, "mock-model").with_timeout(Some(Duration::from_secs(30)));

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { timeout_ms: 30_000 }));
    }

    #[test]
    fn provider_section_model_overrides_top_level() {
        let mut config = docent_config::AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            docent_config::ProviderConfig {
                default_model: Some("llama3".into()),
                ..docent_config::ProviderConfig::default()
            },
        );
        config.providers.insert(
            "openai".into(),
            docent_config::ProviderConfig {
                default_model: Some("gpt-4o-mini".into()),
                ..docent_config::ProviderConfig::default()
            },
        );

        let generator = Generator::from_config(Arc::new(SequentialMockProvider::new(vec![])), &config);
        assert_eq!(generator.model(), "llama3");

        config.providers.remove("ollama");
        let generator = Generator::from_config(Arc::new(SequentialMockProvider::new(vec![])), &config);
        assert_eq!(generator.model(), "mistral");
    }

    #[test]
    fn zero_timeout_in_config_disables_limit() {
        let mut config = docent_config::AppConfig::default();
        config.generation.timeout_secs = 0;
        let generator = Generator::from_config(Arc::new(SequentialMockProvider::new(vec![])), &config);
        assert!(generator.timeout.is_none());
        assert_eq!(generator.model(), "mistral");
    }
}
