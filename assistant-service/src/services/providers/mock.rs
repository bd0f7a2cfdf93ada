//! Mock provider implementations for testing.

use super::{
    AgentRun, AgentRunProvider, CompletionProvider, ProviderError, RunStatus,
};
use crate::models::{
    ChatCompletion, ChatMessage, ChatRole, Embeddings, TextSegment, Transcript, Turn,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Failure a mock should report instead of answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Authentication,
    RateLimited,
    Unavailable,
    Connection,
    Api,
}

impl MockFailure {
    fn to_error(self) -> ProviderError {
        match self {
            MockFailure::Authentication => {
                ProviderError::Authentication("Invalid API key".to_string())
            }
            MockFailure::RateLimited => ProviderError::RateLimited("Slow down".to_string()),
            MockFailure::Unavailable => {
                ProviderError::Unavailable("Service is down".to_string())
            }
            MockFailure::Connection => {
                ProviderError::Connection("Connection refused".to_string())
            }
            MockFailure::Api => ProviderError::Api {
                status: 500,
                message: "Internal error".to_string(),
            },
        }
    }
}

/// Mock completion provider that echoes the last user message.
pub struct MockCompletionProvider {
    failure: Option<MockFailure>,
    empty_choices: bool,
    call_count: AtomicU64,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            failure: None,
            empty_choices: false,
            call_count: AtomicU64::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with the given error.
    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new()
        }
    }

    /// Calls succeed but return no choices.
    pub fn without_choices() -> Self {
        Self {
            empty_choices: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _max_completion_tokens: u32,
    ) -> Result<ChatCompletion, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }

        if let Some(failure) = self.failure {
            return Err(failure.to_error());
        }

        let choices = if self.empty_choices {
            serde_json::json!([])
        } else {
            let prompt = messages
                .iter()
                .rev()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            serde_json::json!([{
                "index": 0,
                "message": { "role": "assistant", "content": format!("Mock response for: {}", prompt) },
                "finish_reason": "stop"
            }])
        };

        serde_json::from_value(serde_json::json!({ "id": "mock", "choices": choices }))
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Three-dimensional vector derived from the input length.
    async fn embed(&self, input: &str, model: &str) -> Result<Embeddings, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.failure {
            return Err(failure.to_error());
        }

        serde_json::from_value(serde_json::json!({
            "model": model,
            "data": [{ "index": 0, "embedding": [input.len() as f32, 1.0, 0.0] }]
        }))
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock agent provider replaying a canned transcript.
///
/// The user message posted to the thread is appended to the transcript
/// before the canned turns, mirroring how a real thread grows.
pub struct MockAgentProvider {
    turns: Vec<Turn>,
    failure: Option<MockFailure>,
    run_error: Option<String>,
    thread_count: AtomicU64,
    posted: Mutex<Vec<String>>,
}

impl MockAgentProvider {
    /// Agent that answers with the given assistant turns.
    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            failure: None,
            run_error: None,
            thread_count: AtomicU64::new(0),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Agent that answers with a single plain-text assistant turn.
    pub fn answering(text: &str) -> Self {
        Self::with_turns(vec![Turn::new(
            ChatRole::Assistant,
            vec![TextSegment::plain(text)],
        )])
    }

    /// Thread creation fails with the given error.
    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::with_turns(Vec::new())
        }
    }

    /// Runs end in the `failed` state with the given error.
    pub fn with_failed_run(last_error: &str) -> Self {
        Self {
            run_error: Some(last_error.to_string()),
            ..Self::with_turns(Vec::new())
        }
    }

    pub fn thread_count(&self) -> u64 {
        self.thread_count.load(Ordering::SeqCst)
    }

    pub fn posted_messages(&self) -> Vec<String> {
        self.posted
            .lock()
            .map(|posted| posted.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AgentRunProvider for MockAgentProvider {
    async fn create_thread(&self) -> Result<String, ProviderError> {
        if let Some(failure) = self.failure {
            return Err(failure.to_error());
        }

        let n = self.thread_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_mock_{}", n))
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        _role: ChatRole,
        content: &str,
    ) -> Result<(), ProviderError> {
        if let Ok(mut posted) = self.posted.lock() {
            posted.push(content.to_string());
        }
        Ok(())
    }

    async fn create_and_process_run(
        &self,
        _thread_id: &str,
        _agent_id: &str,
    ) -> Result<AgentRun, ProviderError> {
        let (status, last_error) = match &self.run_error {
            Some(error) => (RunStatus::Failed, Some(error.clone())),
            None => (RunStatus::Completed, None),
        };

        Ok(AgentRun {
            id: "run_mock".to_string(),
            status,
            last_error,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Transcript, ProviderError> {
        let mut turns: Vec<Turn> = self
            .posted_messages()
            .into_iter()
            .map(|content| Turn::text(ChatRole::User, content))
            .collect();
        turns.extend(self.turns.iter().cloned());

        Ok(Transcript::new(turns))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
