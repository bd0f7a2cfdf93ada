//! Azure AI Agents provider.
//!
//! Drives the threads/messages/runs REST surface of an AI project. A run is
//! polled at a fixed interval until it leaves the pending states, the same
//! way the hosted SDK's create-and-process call behaves.

use super::{AgentRun, AgentRunProvider, ProviderError, RunStatus};
use crate::config::AgentConfig;
use crate::models::{Annotation, AnnotationPayload, ChatRole, TextSegment, Transcript, Turn};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct AzureAgentsProvider {
    config: AgentConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    id: String,
    status: RunStatus,
    #[serde(default)]
    last_error: Option<RunLastError>,
}

#[derive(Debug, Deserialize)]
struct RunLastError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl std::fmt::Display for RunLastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{}: {}", code, message),
            (None, Some(message)) => write!(f, "{}", message),
            (Some(code), None) => write!(f, "{}", code),
            (None, None) => write!(f, "unknown error"),
        }
    }
}

impl From<RunResponse> for AgentRun {
    fn from(run: RunResponse) -> Self {
        AgentRun {
            id: run.id,
            status: run.status,
            last_error: run.last_error.map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    #[serde(default)]
    data: Vec<ThreadMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: ChatRole,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
    #[serde(default)]
    annotations: Vec<AnnotationPayload>,
}

impl From<ThreadMessage> for Turn {
    /// Keeps only text content; images and other parts carry no answer text.
    fn from(message: ThreadMessage) -> Self {
        let segments = message
            .content
            .into_iter()
            .filter(|part| part.kind == "text")
            .filter_map(|part| part.text)
            .map(|text| {
                TextSegment::new(
                    text.value,
                    text.annotations.into_iter().map(Annotation::from).collect(),
                )
            })
            .collect();

        Turn::new(message.role, segments)
    }
}

impl AzureAgentsProvider {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.project_endpoint.trim_end_matches('/'),
            path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query(&[("api-version", self.config.api_version.as_str())])
            .bearer_auth(self.config.access_token.expose_secret())
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
        let response: Response = request.send().await.map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunResponse, ProviderError> {
        let url = self.url(&format!("threads/{}/runs/{}", thread_id, run_id));
        Self::send(self.authorized(self.client.get(&url))).await
    }
}

#[async_trait]
impl AgentRunProvider for AzureAgentsProvider {
    async fn create_thread(&self) -> Result<String, ProviderError> {
        let request = self
            .authorized(self.client.post(self.url("threads")))
            .json(&serde_json::json!({}));
        let thread: ThreadResponse = Self::send(request).await?;

        tracing::debug!(thread_id = %thread.id, "Created agent thread");
        Ok(thread.id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<(), ProviderError> {
        let url = self.url(&format!("threads/{}/messages", thread_id));
        let request = self
            .authorized(self.client.post(&url))
            .json(&CreateMessageRequest { role, content });

        let _: serde_json::Value = Self::send(request).await?;
        Ok(())
    }

    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<AgentRun, ProviderError> {
        let url = self.url(&format!("threads/{}/runs", thread_id));
        let request = self.authorized(self.client.post(&url)).json(&CreateRunRequest {
            assistant_id: agent_id,
        });
        let mut run: RunResponse = Self::send(request).await?;

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        while run.status.is_pending() {
            tokio::time::sleep(poll_interval).await;
            let run_id = run.id.clone();
            run = self.get_run(thread_id, &run_id).await?;
            tracing::debug!(run_id = %run.id, status = ?run.status, "Polled agent run");
        }

        if run.status == RunStatus::RequiresAction {
            tracing::warn!(
                run_id = %run.id,
                "Agent run requested client-side tool output, which this service does not provide"
            );
        }

        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Transcript, ProviderError> {
        let url = self.url(&format!("threads/{}/messages", thread_id));
        let mut turns = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self
                .authorized(self.client.get(&url))
                .query(&[("order", "asc")]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let page: MessagePage = Self::send(request).await?;
            turns.extend(page.data.into_iter().map(Turn::from));

            if !page.has_more {
                break;
            }
            // Never hand back a partial transcript.
            match page.last_id {
                Some(last_id) => after = Some(last_id),
                None => {
                    return Err(ProviderError::InvalidResponse(
                        "Message page has more results but no last_id cursor".to_string(),
                    ));
                }
            }
        }

        Ok(Transcript::new(turns))
    }

    fn name(&self) -> &'static str {
        "azure_agents"
    }
}
