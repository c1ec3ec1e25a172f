//! News publishing and the scheduler loop, driven against the in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use bourse::agents::test_support::{agent_detail, instrument, MockLedger, ScriptedLlm};
use bourse::agents::{LlmRouter, Orchestrator};
use bourse::models::config::OrchestratorConfig;
use bourse::publish_news;
use bourse::scheduler::{run_scheduler, DailySchedule};
use tokio_util::sync::CancellationToken;

fn setup(ledger: MockLedger) -> (Arc<MockLedger>, Arc<ScriptedLlm>, Arc<Orchestrator>) {
    let ledger = Arc::new(
        ledger
            .with_instruments(vec![instrument("TCS", "3890"), instrument("INFY", "1500")])
            .with_agent(agent_detail("a1", "Ada", "gemini-2.5-pro", "1000", &[]))
            .with_agent(agent_detail("a2", "Bob", "ollama/phi3", "1000", &[])),
    );
    let llm = Arc::new(ScriptedLlm::new("scripted").with_default(r#"{"decision":"HOLD"}"#));
    let orchestrator = Arc::new(Orchestrator::new(
        ledger.clone(),
        LlmRouter::new(llm.clone(), llm.clone()),
        "gemini-2.5-pro",
        OrchestratorConfig::default(),
    ));
    (ledger, llm, orchestrator)
}

#[tokio::test]
async fn published_news_is_stored_then_linked_to_logs() {
    let (ledger, llm, orchestrator) = setup(MockLedger::new());

    let report = publish_news(&orchestrator, "Monsoon arrives early", "Agri stocks rally")
        .await
        .unwrap();

    let stored = ledger.news_events();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].headline, "Monsoon arrives early");

    assert_eq!(report.event_id.as_deref(), Some(stored[0].id.as_str()));
    assert_eq!(report.held, 2);
    assert!(ledger
        .logs()
        .iter()
        .all(|l| l.news_event.as_deref() == Some(stored[0].id.as_str())));

    // event stored before any agent ran
    let calls = ledger.calls();
    assert_eq!(calls[0], "news");
    assert!(llm
        .prompts()
        .iter()
        .all(|p| p.contains("Headline: Monsoon arrives early. Details: Agri stocks rally")));
}

#[tokio::test]
async fn news_cycle_runs_even_when_event_cannot_be_stored() {
    let (ledger, _llm, orchestrator) = setup(MockLedger::new().failing_news());

    let report = publish_news(&orchestrator, "Flash crash", "Index down 8%")
        .await
        .unwrap();

    assert!(report.event_id.is_none());
    assert_eq!(report.held, 2);
    assert!(ledger.news_events().is_empty());
    assert!(ledger.logs().iter().all(|l| l.news_event.is_none()));
}

#[tokio::test]
async fn scheduler_stops_on_cancel() {
    let (ledger, _llm, orchestrator) = setup(MockLedger::new());
    let schedule = DailySchedule::new(10, 0, 330).unwrap();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run_scheduler(orchestrator, schedule, cancel.clone()));
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert!(ledger.calls().is_empty());
}
