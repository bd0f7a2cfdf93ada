//! Outbound provider abstractions and implementations.
//!
//! This module provides trait-based abstractions over the two hosted services
//! the assistant talks to, allowing easy swapping between the Azure backends
//! and mocks.

pub mod azure_agents;
pub mod azure_openai;
pub mod mock;

use crate::models::{ChatCompletion, ChatMessage, ChatRole, Embeddings, Transcript};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent run failed: {0}")]
    RunFailed(String),
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ProviderError::Authentication(body),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(body),
            StatusCode::SERVICE_UNAVAILABLE => ProviderError::Unavailable(body),
            _ => ProviderError::Api {
                status: status.as_u16(),
                message: body,
            },
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Connection(err.to_string())
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Authentication(_) => "authentication",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::Connection(_) => "connection",
            ProviderError::Api { .. } => "api",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::RunFailed(_) => "run_failed",
        }
    }
}

/// Trait for chat-completion providers (e.g., Azure OpenAI).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Single non-streaming completion over `messages`.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_completion_tokens: u32,
    ) -> Result<ChatCompletion, ProviderError>;

    /// Embed `input` with the embedding deployment named `model`.
    async fn embed(&self, input: &str, model: &str) -> Result<Embeddings, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;
}

/// Lifecycle status of an agent run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the provider will keep working on the run without input.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }
}

/// A finished (or abandoned) agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub id: String,
    pub status: RunStatus,
    pub last_error: Option<String>,
}

/// Trait for hosted agent providers (e.g., Azure AI Agents).
///
/// One grounded request maps to: create thread, post the user message,
/// run to completion, list messages.
#[async_trait]
pub trait AgentRunProvider: Send + Sync {
    /// Open a new conversation thread and return its id.
    async fn create_thread(&self) -> Result<String, ProviderError>;

    /// Append a message to the thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<(), ProviderError>;

    /// Start a run and block until it leaves the pending states.
    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<AgentRun, ProviderError>;

    /// All messages of the thread, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Transcript, ProviderError>;

    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::BAD_REQUEST, "bad".to_string()),
            ProviderError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_run_status_parsing() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert!(status.is_pending());

        let status: RunStatus = serde_json::from_str("\"completed\"").unwrap();
        assert!(!status.is_pending());

        let status: RunStatus = serde_json::from_str("\"incomplete\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
    }
}
