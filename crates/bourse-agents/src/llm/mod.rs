//! LLM providers and routing.
//!
//! Each provider implements [`LlmBackend`]; [`LlmRouter`] picks one per agent
//! from its resolved [`ModelRoute`].

pub mod gemini;
pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use bourse_models::config::LlmConfig;
use bourse_models::ModelRoute;
use tracing::warn;

use crate::error::AgentError;

pub use gemini::{GeminiBackend, GeminiConfig};
pub use ollama::{OllamaBackend, OllamaConfig};

/// A text-generation provider. Mockable for testing.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn provider(&self) -> &str;

    /// Send `prompt` to `model` and return the raw response text.
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AgentError>;
}

/// Dispatches generation requests to the backend owning a route.
#[derive(Clone)]
pub struct LlmRouter {
    hosted: Arc<dyn LlmBackend>,
    local: Arc<dyn LlmBackend>,
}

impl LlmRouter {
    pub fn new(hosted: Arc<dyn LlmBackend>, local: Arc<dyn LlmBackend>) -> Self {
        Self { hosted, local }
    }

    /// Build the Gemini and Ollama backends from configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AgentError> {
        let hosted = GeminiBackend::new(GeminiConfig::from(config))?;
        if !hosted.is_configured() {
            warn!("Gemini API key not set; agents on hosted models will be skipped each cycle");
        }
        let local = OllamaBackend::new(OllamaConfig::from(config))?;
        Ok(Self::new(Arc::new(hosted), Arc::new(local)))
    }

    pub fn backend(&self, route: &ModelRoute) -> &Arc<dyn LlmBackend> {
        match route {
            ModelRoute::Hosted(_) => &self.hosted,
            ModelRoute::Local(_) => &self.local,
        }
    }

    pub async fn generate(&self, route: &ModelRoute, prompt: &str) -> Result<String, AgentError> {
        self.backend(route)
            .generate(prompt, route.model_name())
            .await
    }
}

/// Map a reqwest failure onto the agent error taxonomy.
pub(crate) fn transport_error(provider: &str, timeout_secs: u64, e: reqwest::Error) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout(timeout_secs)
    } else {
        AgentError::Llm(format!("{provider} request failed: {e}"))
    }
}
