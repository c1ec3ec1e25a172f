pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod llm;
pub mod market;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

pub mod test_support;

pub use dispatcher::{DispatchOutcome, SkipReason, TradeDispatcher};
pub use engine::{AgentVerdict, DecisionEngine};
pub use error::AgentError;
pub use llm::{LlmBackend, LlmRouter};
pub use market::{build_market_context, MarketContext};
pub use orchestrator::{CycleReport, Orchestrator};
