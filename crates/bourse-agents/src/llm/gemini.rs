use std::time::Duration;

use async_trait::async_trait;
use bourse_models::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{transport_error, LlmBackend};
use crate::error::AgentError;

/// Configuration for the hosted Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for GeminiConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(config.hosted_timeout_seconds),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Debug, Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Hosted backend for `gemini-*` models.
pub struct GeminiBackend {
    config: GeminiConfig,
    http: Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Llm(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn provider(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AgentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::Llm("Gemini API key not configured".to_string()))?;

        debug!(model, "Invoking Gemini");
        let url = format!("{}/models/{model}:generateContent", self.config.base_url);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![PartIn { text: prompt }],
            }],
        };

        let timeout_secs = self.config.timeout.as_secs();
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("gemini", timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model, %status, body = %body, "Gemini request failed");
            return Err(AgentError::Llm(format!("gemini returned {status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error("gemini", timeout_secs, e))?;

        response_text(parsed)
            .ok_or_else(|| AgentError::Llm("Gemini returned empty response".to_string()))
    }
}
