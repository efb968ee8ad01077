//! Provider-agnostic summarization entry point.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::models::{PromptPayload, ProviderId, SummaryResult};
use crate::errors::{PipelineError, ProviderError};

use super::gemini::GeminiProvider;
use super::openrouter::OpenRouterProvider;

/// One summarization backend. Implementations make a single attempt and
/// never retry.
#[async_trait]
pub trait SummarizationProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// # Errors
    ///
    /// Returns `Configuration` for a missing credential, `Provider` for
    /// upstream failures and `Timeout` when the call exceeds its deadline.
    async fn summarize(&self, payload: &PromptPayload) -> Result<String, PipelineError>;
}

/// Dispatches to the provider named by the request.
#[derive(Clone, Default)]
pub struct ProviderGateway {
    providers: HashMap<ProviderId, Arc<dyn SummarizationProvider>>,
}

impl ProviderGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers both built-in providers from startup configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .with_provider(Arc::new(GeminiProvider::new(config.gemini.clone())))
            .with_provider(Arc::new(OpenRouterProvider::new(
                config.openrouter.clone(),
                config.openrouter_referer.clone(),
                config.openrouter_title.clone(),
            )))
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn SummarizationProvider>) -> Self {
        self.providers.insert(provider.id(), provider);
        self
    }

    #[must_use]
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` when no provider is registered under
    /// `provider_id`, otherwise whatever the provider reports. An empty
    /// summary is treated as a malformed response.
    pub async fn summarize(
        &self,
        payload: &PromptPayload,
        provider_id: ProviderId,
    ) -> Result<SummaryResult, PipelineError> {
        let provider = self.providers.get(&provider_id).ok_or_else(|| {
            PipelineError::InvalidInput(format!("Unsupported provider: {provider_id}"))
        })?;

        info!(provider = %provider_id, "Sending request to summarization provider");
        let summary_text = provider.summarize(payload).await?;
        let summary_text = summary_text.trim().to_string();

        if summary_text.is_empty() {
            return Err(PipelineError::provider(
                provider_id,
                ProviderError::MalformedResponse("provider returned an empty summary".into()),
            ));
        }

        Ok(SummaryResult {
            summary_text,
            provider_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl SummarizationProvider for Fixed {
        fn id(&self) -> ProviderId {
            ProviderId::OpenRouter
        }

        async fn summarize(&self, _payload: &PromptPayload) -> Result<String, PipelineError> {
            Ok(self.0.to_string())
        }
    }

    fn payload() -> PromptPayload {
        PromptPayload {
            system_prompt: String::new(),
            user_prompt: "text".into(),
        }
    }

    #[tokio::test]
    async fn unregistered_provider_is_invalid_input() {
        let gateway = ProviderGateway::new().with_provider(Arc::new(Fixed("ok")));
        let err = gateway
            .summarize(&payload(), ProviderId::Gemini)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn whitespace_summary_is_malformed() {
        let gateway = ProviderGateway::new().with_provider(Arc::new(Fixed("  \n")));
        let err = gateway
            .summarize(&payload(), ProviderId::OpenRouter)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Provider {
                source: ProviderError::MalformedResponse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn summary_is_trimmed_and_tagged() {
        let gateway = ProviderGateway::new().with_provider(Arc::new(Fixed(" Summary. \n")));
        let result = gateway
            .summarize(&payload(), ProviderId::OpenRouter)
            .await
            .unwrap();
        assert_eq!(result.summary_text, "Summary.");
        assert_eq!(result.provider_id, ProviderId::OpenRouter);
        assert_eq!(gateway.provider_ids(), vec![ProviderId::OpenRouter]);
    }
}
