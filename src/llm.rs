//! OpenAI-compatible client configured for Groq.

use crate::config::AgentSettings;
use crate::error::{Result, SiftError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Chat client type used by the agent.
pub type LlmClient = Client<OpenAIConfig>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a client for the configured API base with the given key.
///
/// There is no limit on the total length of a streamed completion; a
/// request only fails once the API goes silent for `request_timeout_secs`.
pub fn create_client(settings: &AgentSettings, api_key: &str) -> Result<LlmClient> {
    let http_client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
        .map_err(|e| SiftError::AgentConstruction(format!("HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
