//! Azure OpenAI chat-completion and embedding provider.
//!
//! Talks to a model deployment over the REST API with `api-key` auth. Calls
//! are plain request/response; no timeout beyond reqwest's defaults is set.

use super::{CompletionProvider, ProviderError};
use crate::config::OpenAiConfig;
use crate::models::{ChatCompletion, ChatMessage, Embeddings};
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::Serialize;

const API_KEY_HEADER: &str = "api-key";

pub struct AzureOpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

impl AzureOpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/openai/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(status, body))
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_completion_tokens: u32,
    ) -> Result<ChatCompletion, ProviderError> {
        let url = self.url(&format!(
            "deployments/{}/chat/completions",
            self.config.deployment
        ));
        let request = ChatCompletionRequest {
            model: &self.config.deployment,
            messages,
            max_completion_tokens,
        };

        tracing::debug!(
            deployment = %self.config.deployment,
            message_count = messages.len(),
            max_completion_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let completion: ChatCompletion = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion finished"
            );
        }

        Ok(completion)
    }

    async fn embed(&self, input: &str, model: &str) -> Result<Embeddings, ProviderError> {
        let url = self.url(&format!("deployments/{}/embeddings", model));

        tracing::debug!(model, input_len = input.len(), "Sending embedding request");

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&EmbeddingRequest { input, model })
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.url("models"))
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        Self::check(response).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "azure_openai"
    }
}
