use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] bourse_ledger::LedgerError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Unknown model provider for: {0}")]
    UnknownProvider(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("LLM request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Portfolio valuation overflowed for agent {0}")]
    Valuation(String),

    #[error("No market data available")]
    NoMarketData,

    #[error("No agents found")]
    NoAgents,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
