use assistant_service::config::{AgentConfig, AssistantConfig, OpenAiConfig};
use assistant_service::services::init_metrics;
use assistant_service::services::providers::{AgentRunProvider, CompletionProvider};
use assistant_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const TEST_DEPLOYMENT: &str = "gpt-test";
pub const TEST_AGENT_ID: &str = "asst_test";

pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
}

/// Config pointing both providers at the given base URLs, on a random port.
pub fn test_config(openai_endpoint: &str, project_endpoint: &str) -> AssistantConfig {
    AssistantConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
        },
        openai: OpenAiConfig {
            endpoint: openai_endpoint.to_string(),
            api_key: Secret::new("test-api-key".to_string()),
            api_version: "2024-12-01-preview".to_string(),
            deployment: TEST_DEPLOYMENT.to_string(),
            max_completion_tokens: 256,
            system_prompt: "Assistant is a large language model trained by OpenAI.".to_string(),
        },
        agent: AgentConfig {
            project_endpoint: project_endpoint.to_string(),
            agent_id: TEST_AGENT_ID.to_string(),
            access_token: Secret::new("test-token".to_string()),
            api_version: "v1".to_string(),
            poll_interval_ms: 10,
        },
    }
}

impl TestApp {
    /// Spawn against real provider clients talking to the given endpoints.
    pub async fn spawn(openai_endpoint: &str, project_endpoint: &str) -> Self {
        let app = Application::build(test_config(openai_endpoint, project_endpoint))
            .await
            .expect("Failed to build test application");

        Self::start(app).await
    }

    /// Spawn with injected providers.
    pub async fn spawn_with(
        completion: Arc<dyn CompletionProvider>,
        agent: Arc<dyn AgentRunProvider>,
    ) -> Self {
        let app = Application::build_with_providers(
            test_config("http://127.0.0.1:9", "http://127.0.0.1:9"),
            completion,
            agent,
        )
        .await
        .expect("Failed to build test application");

        Self::start(app).await
    }

    async fn start(app: Application) -> Self {
        init_metrics();

        let http_port = app.http_port();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling readiness endpoint
        let client = reqwest::Client::new();
        let ready_url = format!("{}/ready", http_address);
        for _ in 0..50 {
            if client.get(&ready_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            http_port,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_address, path)
    }
}
