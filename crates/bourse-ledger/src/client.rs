use async_trait::async_trait;
use bourse_models::{AgentDetail, AgentSummary, Instrument, LedgerAction, NewAgent, NewsEvent};

use crate::error::LedgerError;

/// The external ledger: service of record for agents, instruments and audit logs.
///
/// Every call either succeeds or fails; callers decide whether a failure is
/// fatal to their unit of work. Mockable for testing.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, LedgerError>;

    /// Instruments in the order the ledger lists them.
    async fn list_instruments(&self) -> Result<Vec<Instrument>, LedgerError>;

    async fn agent_detail(&self, agent_id: &str) -> Result<AgentDetail, LedgerError>;

    async fn create_agent(&self, agent: &NewAgent) -> Result<AgentSummary, LedgerError>;

    async fn submit_action(&self, action: &LedgerAction) -> Result<(), LedgerError>;

    async fn create_news_event(
        &self,
        headline: &str,
        content: &str,
    ) -> Result<NewsEvent, LedgerError>;
}
