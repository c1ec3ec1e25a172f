use std::sync::Arc;
use std::time::Instant;

use bourse_ledger::Ledger;
use bourse_models::config::OrchestratorConfig;
use bourse_models::{AgentSummary, MarketEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatcher::{DispatchOutcome, TradeDispatcher};
use crate::engine::DecisionEngine;
use crate::error::AgentError;
use crate::llm::LlmRouter;
use crate::market::{build_market_context, MarketContext};

/// Tally of one completed cycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub event: &'static str,
    pub event_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub agents: usize,
    /// Agents whose decision reached the dispatcher.
    pub decided: usize,
    pub traded: usize,
    pub held: usize,
    pub skipped: usize,
    pub trade_failed: usize,
    /// Agents that produced no decision (detail, LLM or parse failure, or panic).
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl CycleReport {
    fn new(cycle_id: Uuid, event: &MarketEvent, agents: usize) -> Self {
        Self {
            cycle_id,
            event: event.kind(),
            event_id: event.event_id().map(str::to_string),
            started_at: Utc::now(),
            agents,
            decided: 0,
            traded: 0,
            held: 0,
            skipped: 0,
            trade_failed: 0,
            failed: 0,
            elapsed_ms: 0,
        }
    }

    fn record(&mut self, outcome: &DispatchOutcome) {
        self.decided += 1;
        match outcome {
            DispatchOutcome::Held => self.held += 1,
            DispatchOutcome::Traded { .. } => self.traded += 1,
            DispatchOutcome::Skipped { .. } => self.skipped += 1,
            DispatchOutcome::TradeFailed { .. } => self.trade_failed += 1,
        }
    }
}

/// Runs decision cycles: one market snapshot, then every agent concurrently.
pub struct Orchestrator {
    ledger: Arc<dyn Ledger>,
    engine: Arc<DecisionEngine>,
    dispatcher: Arc<TradeDispatcher>,
    config: OrchestratorConfig,
    cycle_gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        llm: LlmRouter,
        default_model: impl Into<String>,
        config: OrchestratorConfig,
    ) -> Self {
        let engine = DecisionEngine::new(Arc::clone(&ledger), llm, default_model);
        let dispatcher = TradeDispatcher::new(Arc::clone(&ledger));
        Self {
            ledger,
            engine: Arc::new(engine),
            dispatcher: Arc::new(dispatcher),
            config,
            cycle_gate: Mutex::new(()),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// React to a news event. `event_id` is the ledger's id for the persisted event.
    pub async fn trigger_all_agents_with_news(
        &self,
        headline: &str,
        content: &str,
        event_id: Option<String>,
    ) -> Result<CycleReport, AgentError> {
        info!(headline, "Triggering all agents with news");
        self.run_cycle(MarketEvent::news(headline, content, event_id))
            .await
    }

    /// Routine market-open review. Carries no event id.
    pub async fn trigger_daily_market_review(&self) -> Result<CycleReport, AgentError> {
        info!("Triggering daily market review for all agents");
        self.run_cycle(MarketEvent::MarketOpen).await
    }

    /// Fire-and-forget variant of [`Self::run_cycle`]. Failures are logged.
    pub fn spawn_cycle(self: &Arc<Self>, event: MarketEvent) -> JoinHandle<Option<CycleReport>> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.run_cycle(event).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "Decision cycle aborted");
                    None
                }
            }
        })
    }

    pub fn spawn_news_cycle(
        self: &Arc<Self>,
        headline: &str,
        content: &str,
        event_id: Option<String>,
    ) -> JoinHandle<Option<CycleReport>> {
        self.spawn_cycle(MarketEvent::news(headline, content, event_id))
    }

    pub fn spawn_daily_review(self: &Arc<Self>) -> JoinHandle<Option<CycleReport>> {
        self.spawn_cycle(MarketEvent::MarketOpen)
    }

    /// Run one full cycle for `event`.
    ///
    /// Market data or roster unavailable aborts the cycle before any agent runs.
    /// Per-agent failures are logged and counted; they never affect siblings.
    pub async fn run_cycle(&self, event: MarketEvent) -> Result<CycleReport, AgentError> {
        let _serialized = if self.config.serialize_cycles {
            Some(self.cycle_gate.lock().await)
        } else {
            None
        };

        let start = Instant::now();
        let cycle_id = Uuid::new_v4();
        info!(%cycle_id, event = event.kind(), event_id = ?event.event_id(), "Starting decision cycle");

        // 1. Market context, once per cycle
        let market = match build_market_context(self.ledger.as_ref()).await {
            Ok(market) => market,
            Err(e) => {
                error!(%cycle_id, error = %e, "Could not fetch market data. Aborting cycle.");
                return Err(e);
            }
        };

        // 2. Roster
        let agents = match self.ledger.list_agents().await {
            Ok(agents) if !agents.is_empty() => agents,
            Ok(_) => {
                warn!(%cycle_id, "No agents found to trigger.");
                return Err(AgentError::NoAgents);
            }
            Err(e) => {
                error!(%cycle_id, error = %e, "Could not fetch agents. Aborting cycle.");
                return Err(e.into());
            }
        };

        // 3. Fan-out, one task per agent
        let mut report = CycleReport::new(cycle_id, &event, agents.len());
        let market = Arc::new(market);
        let event = Arc::new(event);
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_agents.max(1)));
        let mut tasks = JoinSet::new();

        for agent in agents {
            let engine = Arc::clone(&self.engine);
            let dispatcher = Arc::clone(&self.dispatcher);
            let market = Arc::clone(&market);
            let event = Arc::clone(&event);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let agent_start = Instant::now();
                let result = process_agent(&engine, &dispatcher, &agent, &market, &event).await;
                (agent, result, agent_start.elapsed())
            });
        }

        // 4. Collect (graceful degradation)
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((agent, Ok(outcome), elapsed)) => {
                    info!(
                        %cycle_id,
                        agent_id = %agent.id,
                        agent = %agent.name,
                        outcome = ?outcome,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Agent processed"
                    );
                    report.record(&outcome);
                }
                Ok((agent, Err(e), elapsed)) => {
                    warn!(
                        %cycle_id,
                        agent_id = %agent.id,
                        agent = %agent.name,
                        error = %e,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Agent skipped this cycle"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    error!(%cycle_id, error = %e, "Agent task panicked");
                    report.failed += 1;
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            %cycle_id,
            event = report.event,
            agents = report.agents,
            traded = report.traded,
            held = report.held,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "All agents have been processed"
        );

        Ok(report)
    }
}

async fn process_agent(
    engine: &DecisionEngine,
    dispatcher: &TradeDispatcher,
    agent: &AgentSummary,
    market: &MarketContext,
    event: &MarketEvent,
) -> Result<DispatchOutcome, AgentError> {
    let verdict = engine.decide(agent, market, event).await?;
    Ok(dispatcher
        .dispatch(
            &verdict.agent_id,
            &verdict.decision,
            verdict.net_worth,
            event.event_id(),
        )
        .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{agent_detail, decision_json, instrument, MockLedger, ScriptedLlm};

    fn orchestrator(ledger: Arc<MockLedger>, llm: Arc<ScriptedLlm>) -> Orchestrator {
        Orchestrator::new(
            ledger,
            LlmRouter::new(llm.clone(), llm),
            "gemini-2.5-pro",
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_market_aborts_before_roster_fetch() {
        let ledger = Arc::new(
            MockLedger::new().with_agent(agent_detail("a1", "Ada", "gemini-2.5-pro", "10", &[])),
        );
        let llm = Arc::new(ScriptedLlm::new("gemini").with_default("{}"));

        let result = orchestrator(ledger.clone(), llm.clone())
            .trigger_daily_market_review()
            .await;

        assert!(matches!(result, Err(AgentError::NoMarketData)));
        assert_eq!(ledger.call_count("list_agents"), 0);
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn empty_roster_runs_no_tasks() {
        let ledger = Arc::new(MockLedger::new().with_instruments(vec![instrument("TCS", "1")]));
        let llm = Arc::new(ScriptedLlm::new("gemini").with_default("{}"));

        let result = orchestrator(ledger.clone(), llm.clone())
            .trigger_daily_market_review()
            .await;

        assert!(matches!(result, Err(AgentError::NoAgents)));
        assert_eq!(ledger.call_count("agent_detail"), 0);
        assert!(ledger.actions().is_empty());
    }

    #[tokio::test]
    async fn news_cycle_tags_logs_with_event_id() {
        let ledger = Arc::new(
            MockLedger::new()
                .with_instruments(vec![instrument("TCS", "10")])
                .with_agent(agent_detail("a1", "Ada", "gemini-2.5-pro", "1000", &[])),
        );
        let llm = Arc::new(
            ScriptedLlm::new("gemini")
                .with_default(&decision_json("BUY", Some("TCS"), serde_json::json!(1))),
        );

        let report = orchestrator(ledger.clone(), llm.clone())
            .trigger_all_agents_with_news("Merger", "Two banks merge", Some("n42".into()))
            .await
            .unwrap();

        assert_eq!(report.event, "news");
        assert_eq!(report.event_id.as_deref(), Some("n42"));
        assert_eq!(report.traded, 1);
        assert_eq!(ledger.logs()[0].news_event.as_deref(), Some("n42"));
        assert!(llm.prompts()[0].contains("Headline: Merger. Details: Two banks merge"));
    }

    #[tokio::test]
    async fn spawned_review_returns_report() {
        let ledger = Arc::new(
            MockLedger::new()
                .with_instruments(vec![instrument("TCS", "10")])
                .with_agent(agent_detail("a1", "Ada", "gemini-2.5-pro", "1000", &[])),
        );
        let llm = Arc::new(ScriptedLlm::new("gemini").with_default(r#"{"decision":"HOLD"}"#));
        let orchestrator = Arc::new(orchestrator(ledger.clone(), llm));

        let report = orchestrator.spawn_daily_review().await.unwrap().unwrap();

        assert_eq!(report.held, 1);
        assert_eq!(report.decided, 1);
        assert!(report.event_id.is_none());
        assert!(ledger.logs()[0].news_event.is_none());
    }

    #[tokio::test]
    async fn spawned_cycle_swallows_abort() {
        let ledger = Arc::new(MockLedger::new());
        let llm = Arc::new(ScriptedLlm::new("gemini"));
        let orchestrator = Arc::new(orchestrator(ledger, llm));

        let report = orchestrator.spawn_daily_review().await.unwrap();
        assert!(report.is_none());
    }
}
