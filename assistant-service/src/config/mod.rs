use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Completion budget used when `OPENAI_MAX_COMPLETION_TOKENS` is unset.
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 40_000;

/// Delay between agent-run status polls.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

const DEFAULT_SYSTEM_PROMPT: &str = "Assistant is a large language model trained by OpenAI.";

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_key: Secret<String>,
    pub api_version: String,
    /// Model deployment name; also sent as `model`.
    pub deployment: String,
    pub max_completion_tokens: u32,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// AI project endpoint hosting the agent.
    pub project_endpoint: String,
    pub agent_id: String,
    /// Entra ID bearer token for the project.
    pub access_token: Secret<String>,
    pub api_version: String,
    pub poll_interval_ms: u64,
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(AssistantConfig {
            common: common_config,
            openai: OpenAiConfig {
                endpoint: get_env("OPENAI_ENDPOINT", None)?,
                api_key: Secret::new(get_env("OPENAI_API_KEY", None)?),
                api_version: get_env("OPENAI_API_VERSION", None)?,
                deployment: get_env("OPENAI_MODEL_DEPLOYMENT_NAME", None)?,
                max_completion_tokens: get_env(
                    "OPENAI_MAX_COMPLETION_TOKENS",
                    Some(&DEFAULT_MAX_COMPLETION_TOKENS.to_string()),
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_COMPLETION_TOKENS),
                system_prompt: get_env("OPENAI_SYSTEM_PROMPT", Some(DEFAULT_SYSTEM_PROMPT))?,
            },
            agent: AgentConfig {
                project_endpoint: get_env("AZURE_AI_PROJECT_ENDPOINT", None)?,
                agent_id: get_env("AZURE_AI_AGENT_ID", None)?,
                access_token: Secret::new(get_env("AZURE_AI_ACCESS_TOKEN", None)?),
                api_version: get_env("AZURE_AI_API_VERSION", Some("v1"))?,
                poll_interval_ms: get_env(
                    "AZURE_AI_POLL_INTERVAL_MS",
                    Some(&DEFAULT_POLL_INTERVAL_MS.to_string()),
                )?
                .parse()
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            },
        })
    }
}

/// Read `key`, falling back to `default`; keys without a default are required.
fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match (env::var(key), default) {
        (Ok(val), _) => Ok(val),
        (Err(_), Some(def)) => Ok(def.to_string()),
        (Err(_), None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_uses_default() {
        let value = get_env("ASSISTANT_TEST_UNSET_KEY", Some("fallback")).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_get_env_missing_required() {
        let err = get_env("ASSISTANT_TEST_UNSET_KEY", None).unwrap_err();
        assert!(err.to_string().contains("ASSISTANT_TEST_UNSET_KEY is required but not set"));
    }
}
