use std::time::Duration;

use async_trait::async_trait;
use bourse_models::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::{transport_error, LlmBackend};
use crate::error::AgentError;

/// Configuration for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for OllamaConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.local_timeout_seconds),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    format: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Local backend for `ollama/<name>` models. Requests JSON, non-streaming output.
pub struct OllamaBackend {
    config: OllamaConfig,
    http: Client,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Llm(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn provider(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AgentError> {
        let url = self.generate_url();
        debug!(model, %url, "Invoking Ollama");

        let request = GenerateRequest {
            model,
            prompt,
            format: "json",
            stream: false,
        };

        let timeout_secs = self.config.timeout.as_secs();
        let response = match self.http.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                error!(%url, "Failed to connect to local Ollama API; is Ollama running?");
                return Err(AgentError::Llm(format!("ollama unreachable at {url}: {e}")));
            }
            Err(e) => return Err(transport_error("ollama", timeout_secs, e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model, %status, body = %body, "Ollama request failed");
            return Err(AgentError::Llm(format!("ollama returned {status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error("ollama", timeout_secs, e))?;

        // With format=json the decision arrives as a JSON string in `response`.
        let text = parsed.response.unwrap_or_else(|| "{}".to_string());
        if text.trim().is_empty() {
            return Err(AgentError::Llm("Ollama returned empty response".to_string()));
        }
        Ok(text)
    }
}
