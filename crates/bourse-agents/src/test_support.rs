//! In-memory doubles for the ledger and the LLM providers.
//!
//! `MockLedger` records every successful write so tests can assert on the
//! exact ledger traffic of a cycle. `ScriptedLlm` answers prompts from a
//! script and tracks how many generations run at once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bourse_ledger::{Ledger, LedgerError};
use bourse_models::{
    AgentDetail, AgentSummary, AuditEntry, Holding, Instrument, LedgerAction, NewAgent, NewsEvent,
    StockRef,
};
use rust_decimal::Decimal;

use crate::error::AgentError;
use crate::llm::LlmBackend;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn decimal(literal: &str) -> Decimal {
    literal
        .parse()
        .unwrap_or_else(|_| panic!("invalid decimal literal: {literal}"))
}

fn unavailable(what: &str) -> LedgerError {
    LedgerError::Status {
        status: 503,
        body: format!("{what} unavailable"),
    }
}

#[derive(Default)]
struct LedgerState {
    instruments: Vec<Instrument>,
    roster: Vec<AgentSummary>,
    details: HashMap<String, AgentDetail>,
    actions: Vec<LedgerAction>,
    news: Vec<NewsEvent>,
    created: Vec<NewAgent>,
    calls: Vec<String>,
}

/// Ledger double. Builders configure data and failure modes.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    failing_detail: HashSet<String>,
    fail_instruments: bool,
    fail_roster: bool,
    fail_logs: bool,
    fail_trades: bool,
    fail_news: bool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruments(self, instruments: Vec<Instrument>) -> Self {
        lock(&self.state).instruments = instruments;
        self
    }

    /// Register an agent's detail and add it to the roster.
    pub fn with_agent(self, detail: AgentDetail) -> Self {
        {
            let mut state = lock(&self.state);
            state.roster.push(AgentSummary {
                id: detail.id.clone(),
                name: detail.name.clone(),
                persona: detail.persona.clone(),
                model: detail.model.clone(),
            });
            state.details.insert(detail.id.clone(), detail);
        }
        self
    }

    pub fn failing_detail(mut self, agent_id: &str) -> Self {
        self.failing_detail.insert(agent_id.to_string());
        self
    }

    pub fn failing_instruments(mut self) -> Self {
        self.fail_instruments = true;
        self
    }

    pub fn failing_roster(mut self) -> Self {
        self.fail_roster = true;
        self
    }

    pub fn failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    pub fn failing_trades(mut self) -> Self {
        self.fail_trades = true;
        self
    }

    pub fn failing_news(mut self) -> Self {
        self.fail_news = true;
        self
    }

    /// Accepted writes, in submission order.
    pub fn actions(&self) -> Vec<LedgerAction> {
        lock(&self.state).actions.clone()
    }

    pub fn logs(&self) -> Vec<AuditEntry> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                LedgerAction::Log(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    pub fn trades(&self) -> Vec<LedgerAction> {
        self.actions()
            .into_iter()
            .filter(|action| !matches!(action, LedgerAction::Log(_)))
            .collect()
    }

    /// Actions accepted for one agent.
    pub fn actions_for(&self, agent_id: &str) -> Vec<LedgerAction> {
        self.actions()
            .into_iter()
            .filter(|action| action.agent_id() == agent_id)
            .collect()
    }

    /// Every trait method invoked, by name, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    pub fn news_events(&self) -> Vec<NewsEvent> {
        lock(&self.state).news.clone()
    }

    pub fn created_agents(&self) -> Vec<NewAgent> {
        lock(&self.state).created.clone()
    }

    fn record_call(&self, method: &str) {
        lock(&self.state).calls.push(method.to_string());
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, LedgerError> {
        self.record_call("list_agents");
        if self.fail_roster {
            return Err(unavailable("roster"));
        }
        Ok(lock(&self.state).roster.clone())
    }

    async fn list_instruments(&self) -> Result<Vec<Instrument>, LedgerError> {
        self.record_call("list_instruments");
        if self.fail_instruments {
            return Err(unavailable("instruments"));
        }
        Ok(lock(&self.state).instruments.clone())
    }

    async fn agent_detail(&self, agent_id: &str) -> Result<AgentDetail, LedgerError> {
        self.record_call("agent_detail");
        if self.failing_detail.contains(agent_id) {
            return Err(unavailable("agent detail"));
        }
        lock(&self.state)
            .details
            .get(agent_id)
            .cloned()
            .ok_or_else(|| LedgerError::Status {
                status: 404,
                body: format!("agent {agent_id} not found"),
            })
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<AgentSummary, LedgerError> {
        self.record_call("create_agent");
        let mut state = lock(&self.state);
        let summary = AgentSummary {
            id: format!("agent-{}", state.created.len() + 1),
            name: agent.name.clone(),
            persona: agent.persona.clone(),
            model: Some(agent.model.clone()),
        };
        state.created.push(agent.clone());
        state.roster.push(summary.clone());
        Ok(summary)
    }

    async fn submit_action(&self, action: &LedgerAction) -> Result<(), LedgerError> {
        self.record_call(action.endpoint());
        match action {
            LedgerAction::Log(_) if self.fail_logs => return Err(unavailable("audit log")),
            LedgerAction::Buy(_) | LedgerAction::Sell(_) if self.fail_trades => {
                return Err(LedgerError::Rejected("Insufficient funds".to_string()))
            }
            _ => {}
        }
        lock(&self.state).actions.push(action.clone());
        Ok(())
    }

    async fn create_news_event(
        &self,
        headline: &str,
        content: &str,
    ) -> Result<NewsEvent, LedgerError> {
        self.record_call("news");
        if self.fail_news {
            return Err(LedgerError::Rejected("news_headline is required".to_string()));
        }
        let mut state = lock(&self.state);
        let event = NewsEvent {
            id: format!("news-{}", state.news.len() + 1),
            headline: headline.to_string(),
            content: content.to_string(),
            created_at: None,
        };
        state.news.push(event.clone());
        Ok(event)
    }
}

/// LLM double answering from a script.
///
/// Per-agent responses are matched on the agent name embedded in the prompt;
/// anything unmatched gets the default response.
#[derive(Default)]
pub struct ScriptedLlm {
    provider: String,
    default: Option<String>,
    by_agent: Vec<(String, String)>,
    fail: bool,
    latency: Option<Duration>,
    seen: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, raw: &str) -> Self {
        self.default = Some(raw.to_string());
        self
    }

    pub fn with_response_for(mut self, agent_name: &str, raw: &str) -> Self {
        self.by_agent.push((agent_name.to_string(), raw.to_string()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.seen).iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn models_seen(&self) -> Vec<String> {
        lock(&self.seen).iter().map(|(m, _)| m.clone()).collect()
    }

    /// Highest number of generations observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn response_for(&self, prompt: &str) -> Option<String> {
        self.by_agent
            .iter()
            .find(|(name, _)| prompt.contains(&format!("named '{name}'")))
            .map(|(_, raw)| raw.clone())
            .or_else(|| self.default.clone())
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String, AgentError> {
        lock(&self.seen).push((model.to_string(), prompt.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(AgentError::Llm(format!("{} unavailable", self.provider)));
        }
        self.response_for(prompt)
            .ok_or_else(|| AgentError::Llm(format!("no scripted response for {model}")))
    }
}

/// Agent detail with `(symbol, quantity, price)` holdings. An empty model means none.
pub fn agent_detail(
    id: &str,
    name: &str,
    model: &str,
    balance: &str,
    holdings: &[(&str, &str, &str)],
) -> AgentDetail {
    AgentDetail {
        id: id.to_string(),
        name: name.to_string(),
        persona: format!("{name} persona"),
        model: (!model.is_empty()).then(|| model.to_string()),
        balance: decimal(balance),
        portfolio: holdings
            .iter()
            .map(|(symbol, quantity, price)| Holding {
                stock: Some(StockRef {
                    symbol: symbol.to_string(),
                    name: None,
                    price: Some(decimal(price)),
                }),
                quantity: decimal(quantity),
                average_buy_price: Decimal::ZERO,
            })
            .collect(),
    }
}

pub fn instrument(symbol: &str, price: &str) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        name: None,
        sector: None,
        price: decimal(price),
    }
}

/// Raw LLM output for a decision.
pub fn decision_json(action: &str, symbol: Option<&str>, quantity: serde_json::Value) -> String {
    serde_json::json!({
        "emotion": "Confident",
        "reasoning": "Scripted decision.",
        "decision": action,
        "symbol": symbol,
        "quantity": quantity,
    })
    .to_string()
}
