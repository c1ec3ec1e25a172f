use serde::{Deserialize, Serialize};

/// Top-level configuration for bourse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BourseConfig {
    pub ledger: LedgerConfig,
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
    pub schedule: ScheduleConfig,
}

/// Connection settings for the external ledger REST service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used for agents whose ledger record names none.
    pub default_model: String,
    pub gemini_base_url: String,
    /// Usually supplied through `GEMINI_API_KEY` rather than the file.
    pub gemini_api_key: Option<String>,
    pub hosted_timeout_seconds: u64,
    /// Root of the local Ollama server.
    pub ollama_url: String,
    pub local_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.5-pro".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_api_key: None,
            hosted_timeout_seconds: 60,
            ollama_url: "http://localhost:11434".to_string(),
            local_timeout_seconds: 60,
        }
    }
}

/// Fan-out policy for decision cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on agent tasks in flight within one cycle.
    pub max_concurrent_agents: usize,
    /// Queue overlapping cycles so only one runs at a time.
    pub serialize_cycles: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: 8,
            serialize_cycles: true,
        }
    }
}

/// When the daily market review fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    /// Offset of the schedule's wall clock from UTC. 330 is IST.
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 10,
            minute: 0,
            utc_offset_minutes: 330,
        }
    }
}
