use std::fmt;

use serde::{Deserialize, Serialize};

/// Which LLM provider serves an agent, and under what model name.
///
/// Resolved once from the agent's model identifier when its detail is fetched:
/// - `gemini-*` is served by the hosted API with the identifier unchanged
/// - `ollama/<name>` is served by the local endpoint as `<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "provider", content = "model", rename_all = "snake_case")]
pub enum ModelRoute {
    Hosted(String),
    Local(String),
}

pub const HOSTED_PREFIX: &str = "gemini-";
pub const LOCAL_PREFIX: &str = "ollama/";

impl ModelRoute {
    /// Returns None for identifiers with an unknown provider prefix.
    pub fn resolve(model_id: &str) -> Option<Self> {
        let model_id = model_id.trim();
        if model_id.starts_with(HOSTED_PREFIX) {
            return Some(Self::Hosted(model_id.to_string()));
        }
        match model_id.strip_prefix(LOCAL_PREFIX) {
            Some(local) if !local.is_empty() => Some(Self::Local(local.to_string())),
            _ => None,
        }
    }

    /// Model name as the provider expects it.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Hosted(name) | Self::Local(name) => name,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::Hosted(_) => "gemini",
            Self::Local(_) => "ollama",
        }
    }
}

impl fmt::Display for ModelRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider(), self.model_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_prefix_routes_local_with_stripped_name() {
        let route = ModelRoute::resolve("ollama/tinyllama").unwrap();
        assert_eq!(route, ModelRoute::Local("tinyllama".to_string()));
        assert_eq!(route.model_name(), "tinyllama");
        assert_eq!(route.provider(), "ollama");
    }

    #[test]
    fn gemini_prefix_routes_hosted_unchanged() {
        let route = ModelRoute::resolve("gemini-2.5-pro").unwrap();
        assert_eq!(route, ModelRoute::Hosted("gemini-2.5-pro".to_string()));
        assert_eq!(route.model_name(), "gemini-2.5-pro");
    }

    #[test]
    fn local_model_keeps_tag_after_prefix() {
        let route = ModelRoute::resolve("ollama/llama3:8b").unwrap();
        assert_eq!(route.model_name(), "llama3:8b");
    }

    #[test]
    fn unknown_providers_do_not_resolve() {
        assert!(ModelRoute::resolve("gpt-4o").is_none());
        assert!(ModelRoute::resolve("gemini").is_none());
        assert!(ModelRoute::resolve("ollama/").is_none());
        assert!(ModelRoute::resolve("").is_none());
    }

    #[test]
    fn display_names_provider_and_model() {
        let route = ModelRoute::Local("phi3".to_string());
        assert_eq!(route.to_string(), "ollama:phi3");
    }
}
