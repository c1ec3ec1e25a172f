use std::sync::Arc;

use bourse_ledger::Ledger;
use bourse_models::{AgentSummary, Decision, MarketEvent, ModelRoute};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::llm::LlmRouter;
use crate::market::MarketContext;
use crate::parser::parse_decision;
use crate::prompts::{agent_prompt, with_output_schema};

/// One agent's parsed decision plus the snapshot it was made against.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentVerdict {
    pub agent_id: String,
    pub route: ModelRoute,
    pub net_worth: Decimal,
    pub decision: Decision,
}

/// Builds each agent's prompt, queries its LLM and parses the decision.
pub struct DecisionEngine {
    ledger: Arc<dyn Ledger>,
    llm: LlmRouter,
    default_model: String,
}

impl DecisionEngine {
    pub fn new(ledger: Arc<dyn Ledger>, llm: LlmRouter, default_model: impl Into<String>) -> Self {
        Self {
            ledger,
            llm,
            default_model: default_model.into(),
        }
    }

    /// Decide for one agent. Every failure is local to this agent: the caller
    /// logs it and skips the agent for this cycle.
    pub async fn decide(
        &self,
        agent: &AgentSummary,
        market: &MarketContext,
        event: &MarketEvent,
    ) -> Result<AgentVerdict, AgentError> {
        let detail = self.ledger.agent_detail(&agent.id).await?;

        let model_id = detail.model_id(&self.default_model).to_string();
        let route = ModelRoute::resolve(&model_id)
            .ok_or_else(|| AgentError::UnknownProvider(model_id.clone()))?;

        let valuation = detail
            .valuation()
            .ok_or_else(|| AgentError::Valuation(detail.id.clone()))?;

        let prompt = with_output_schema(&agent_prompt(&detail, &valuation, &model_id, market, event));
        info!(agent_id = %detail.id, model = %route, "Routing decision");
        debug!(agent_id = %detail.id, prompt = %prompt, "Agent prompt");

        let raw = self.llm.generate(&route, &prompt).await?;
        debug!(agent_id = %detail.id, model = %route, raw = %raw, "LLM raw response");

        let decision = parse_decision(&raw)?;

        Ok(AgentVerdict {
            agent_id: detail.id,
            route,
            net_worth: valuation.net_worth,
            decision,
        })
    }
}
