//! Application startup and lifecycle management.
//!
//! Provider clients are constructed once here and handed to every request
//! through [`AppState`].

use crate::config::AssistantConfig;
use crate::handlers;
use crate::services::providers::azure_agents::AzureAgentsProvider;
use crate::services::providers::azure_openai::AzureOpenAiProvider;
use crate::services::providers::{AgentRunProvider, CompletionProvider};
use crate::services::{metrics::http_metrics_middleware, AgentSession, CompletionClient};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub completion: CompletionClient,
    pub agent: AgentSession,
}

impl AppState {
    pub fn new(
        config: &AssistantConfig,
        completion_provider: Arc<dyn CompletionProvider>,
        agent_provider: Arc<dyn AgentRunProvider>,
    ) -> Self {
        Self {
            completion: CompletionClient::new(
                completion_provider,
                config.openai.system_prompt.clone(),
                config.openai.max_completion_tokens,
            ),
            agent: AgentSession::new(agent_provider, config.agent.agent_id.clone()),
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("No such route"))
}

/// Build the HTTP router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/completion", get(handlers::completion))
        .route("/chat", post(handlers::chat))
        .route("/bing-grounding", post(handlers::bing_grounding))
        .fallback(not_found)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Azure providers described by `config`.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let completion_provider: Arc<dyn CompletionProvider> =
            Arc::new(AzureOpenAiProvider::new(config.openai.clone()));
        tracing::info!(
            deployment = %config.openai.deployment,
            "Initialized Azure OpenAI completion provider"
        );

        let agent_provider: Arc<dyn AgentRunProvider> =
            Arc::new(AzureAgentsProvider::new(config.agent.clone()));
        tracing::info!(
            agent_id = %config.agent.agent_id,
            "Initialized Azure AI agent provider"
        );

        Self::build_with_providers(config, completion_provider, agent_provider).await
    }

    /// Build the application around already-constructed providers.
    pub async fn build_with_providers(
        config: AssistantConfig,
        completion_provider: Arc<dyn CompletionProvider>,
        agent_provider: Arc<dyn AgentRunProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(&config, completion_provider, agent_provider);

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Assistant service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the application until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.http_listener, router(self.state))
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
