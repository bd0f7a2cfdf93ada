//! Direct chat-completion flow.

use crate::models::ChatMessage;
use crate::services::metrics::{record_provider_error, record_provider_latency};
use crate::services::providers::{CompletionProvider, ProviderError};
use std::sync::Arc;
use std::time::Instant;

/// Sentence returned to callers whenever a completion cannot be produced.
pub const COMPLETION_FALLBACK: &str =
    "There was an issue with your request, please try again later";

/// Wraps a completion provider with the service's prompt and token budget.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    max_completion_tokens: u32,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        system_prompt: impl Into<String>,
        max_completion_tokens: u32,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            max_completion_tokens,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    /// Answer a single query behind the configured system prompt.
    pub async fn ask(&self, query: &str) -> String {
        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(query),
        ];
        self.complete(&messages).await
    }

    /// Complete a caller-supplied conversation with the default budget.
    pub async fn complete(&self, messages: &[ChatMessage]) -> String {
        self.complete_with_budget(messages, self.max_completion_tokens)
            .await
    }

    /// Complete `messages`, collapsing every failure into [`COMPLETION_FALLBACK`].
    pub async fn complete_with_budget(
        &self,
        messages: &[ChatMessage],
        max_completion_tokens: u32,
    ) -> String {
        match self.try_complete(messages, max_completion_tokens).await {
            Ok(text) => text,
            Err(e) => {
                record_provider_error(self.provider.name(), e.kind());
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    "Chat completion failed"
                );
                COMPLETION_FALLBACK.to_string()
            }
        }
    }

    /// First choice text, or the provider/extraction error.
    pub async fn try_complete(
        &self,
        messages: &[ChatMessage],
        max_completion_tokens: u32,
    ) -> Result<String, ProviderError> {
        let start = Instant::now();
        let completion = self
            .provider
            .complete(messages, max_completion_tokens)
            .await;
        record_provider_latency(
            self.provider.name(),
            "chat_completion",
            start.elapsed().as_secs_f64(),
        );

        completion?
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Completion has no first choice content".to_string())
            })
    }

    /// Embedding vector for `input` from the `model` deployment.
    ///
    /// Unlike completions, failures are returned to the caller.
    pub async fn embed(&self, input: &str, model: &str) -> Result<Vec<f32>, ProviderError> {
        let start = Instant::now();
        let result = self.provider.embed(input, model).await;
        record_provider_latency(
            self.provider.name(),
            "embedding",
            start.elapsed().as_secs_f64(),
        );

        let vector = result.and_then(|embeddings| {
            embeddings
                .first_vector()
                .map(<[f32]>::to_vec)
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("Embedding response has no data".to_string())
                })
        });

        if let Err(e) = &vector {
            record_provider_error(self.provider.name(), e.kind());
            tracing::warn!(provider = self.provider.name(), model, error = %e, "Embedding failed");
        }

        vector
    }
}
