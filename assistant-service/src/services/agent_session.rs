//! Grounded-agent flow: one thread per request, run to completion, normalize.

use crate::models::{CitationSource, ChatRole, Transcript};
use crate::services::metrics::{
    record_agent_reply, record_citation, record_provider_error, record_provider_latency,
};
use crate::services::normalizer::{normalize, AgentReply};
use crate::services::providers::{AgentRunProvider, ProviderError, RunStatus};
use std::sync::Arc;
use std::time::Instant;

/// Runs single-shot conversations against a hosted agent.
#[derive(Clone)]
pub struct AgentSession {
    provider: Arc<dyn AgentRunProvider>,
    agent_id: String,
}

impl AgentSession {
    pub fn new(provider: Arc<dyn AgentRunProvider>, agent_id: impl Into<String>) -> Self {
        Self {
            provider,
            agent_id: agent_id.into(),
        }
    }

    /// Post `message` to a fresh thread, run the agent, and fetch the thread.
    ///
    /// A run that ends in `failed` is reported as [`ProviderError::RunFailed`].
    #[tracing::instrument(skip(self, message), fields(agent_id = %self.agent_id))]
    pub async fn run_once(&self, message: &str) -> Result<Transcript, ProviderError> {
        let provider = self.provider.name();

        let start = Instant::now();
        let thread_id = self.provider.create_thread().await?;
        record_provider_latency(provider, "create_thread", start.elapsed().as_secs_f64());

        let start = Instant::now();
        self.provider
            .create_message(&thread_id, ChatRole::User, message)
            .await?;
        record_provider_latency(provider, "create_message", start.elapsed().as_secs_f64());

        let start = Instant::now();
        let run = self
            .provider
            .create_and_process_run(&thread_id, &self.agent_id)
            .await?;
        record_provider_latency(provider, "run", start.elapsed().as_secs_f64());

        tracing::info!(thread_id = %thread_id, run_id = %run.id, status = ?run.status, "Agent run finished");

        if run.status == RunStatus::Failed {
            return Err(ProviderError::RunFailed(
                run.last_error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let start = Instant::now();
        let transcript = self.provider.list_messages(&thread_id).await?;
        record_provider_latency(provider, "list_messages", start.elapsed().as_secs_f64());

        Ok(transcript)
    }

    /// Answer `message`, always producing a caller-facing string.
    ///
    /// Failures are surfaced verbatim as `Error processing request: <message>`.
    pub async fn chat(&self, message: &str) -> String {
        let transcript = match self.run_once(message).await {
            Ok(transcript) => transcript,
            Err(ProviderError::RunFailed(last_error)) => {
                record_agent_reply("run_failed");
                tracing::warn!(error = %last_error, "Agent run failed");
                return format!("Agent run failed: {}", last_error);
            }
            Err(e) => {
                record_provider_error(self.provider.name(), e.kind());
                record_agent_reply("error");
                tracing::error!(error = %e, "Grounded request failed");
                return format!("Error processing request: {}", e);
            }
        };

        let reply = normalize(&transcript);
        match &reply {
            AgentReply::Answer(result) => {
                record_agent_reply("answer");
                for citation in &result.citations {
                    record_citation(match citation.source {
                        CitationSource::File { .. } => "file",
                        CitationSource::Url { .. } => "url",
                    });
                }
            }
            AgentReply::NoResponse => record_agent_reply("no_response"),
        }

        reply.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, NormalizedResult, TextSegment, Turn};
    use crate::services::providers::mock::{MockAgentProvider, MockFailure};

    #[tokio::test]
    async fn test_chat_returns_normalized_json() {
        let provider = Arc::new(MockAgentProvider::with_turns(vec![Turn::new(
            ChatRole::Assistant,
            vec![TextSegment::new(
                "Paris【3:0†source】",
                vec![Annotation::UrlCitation {
                    url: "https://x.test".to_string(),
                    title: Some("X".to_string()),
                }],
            )],
        )]));
        let session = AgentSession::new(provider.clone(), "asst_1");

        let reply = session.chat("capital of france?").await;
        let parsed: NormalizedResult = serde_json::from_str(&reply).unwrap();

        assert_eq!(parsed.content, "Paris");
        assert_eq!(parsed.citations.len(), 1);
        assert_eq!(parsed.citations[0].id, 1);
        assert_eq!(provider.posted_messages(), vec!["capital of france?".to_string()]);
        assert_eq!(provider.thread_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_without_assistant_turn() {
        let session = AgentSession::new(Arc::new(MockAgentProvider::with_turns(vec![])), "asst_1");
        assert_eq!(session.chat("hi").await, "No response from agent");
    }

    #[tokio::test]
    async fn test_thread_creation_failure_is_formatted() {
        let session = AgentSession::new(
            Arc::new(MockAgentProvider::failing(MockFailure::Connection)),
            "asst_1",
        );

        let reply = session.chat("hi").await;
        assert!(reply.starts_with("Error processing request: "));
        assert!(reply.contains("Connection refused"));
    }

    #[tokio::test]
    async fn test_failed_run_reports_last_error() {
        let session = AgentSession::new(
            Arc::new(MockAgentProvider::with_failed_run("server_error: quota exceeded")),
            "asst_1",
        );

        assert!(matches!(
            session.run_once("hi").await,
            Err(ProviderError::RunFailed(_))
        ));
        assert_eq!(
            session.chat("hi").await,
            "Agent run failed: server_error: quota exceeded"
        );
    }
}
