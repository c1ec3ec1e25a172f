//! bourse - multi-agent LLM trading orchestrator
//!
//! Each cycle snapshots market prices from the ledger, asks every trading
//! agent's LLM for a BUY/SELL/HOLD decision, and writes the audit log and any
//! trade back to the ledger.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use bourse::models::config::BourseConfig;
//! use bourse::agents::{Orchestrator, CycleReport};
//! use bourse::ledger::{Ledger, HttpLedger};
//! ```

pub use bourse_agents as agents;
pub use bourse_ledger as ledger;
pub use bourse_models as models;

pub mod scheduler;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use bourse_agents::{AgentError, CycleReport, LlmRouter, Orchestrator};
use bourse_ledger::{HttpLedger, Ledger};
use bourse_models::config::BourseConfig;
use bourse_models::{AgentSummary, ModelRoute, NewAgent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Overrides the ledger base URL.
pub const LEDGER_URL_ENV: &str = "NODE_BASE_URL";
/// Supplies the hosted LLM API key.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Log directives used when `RUST_LOG` is unset or blank.
pub const DEFAULT_LOG_DIRECTIVES: &str = "info";

/// Build the log filter from `RUST_LOG` directives, falling back to
/// [`DEFAULT_LOG_DIRECTIVES`] when they are absent, blank or invalid.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

/// Load configuration from `path`, then apply environment overrides.
///
/// A missing file is not an error: defaults are used.
pub fn load_config(path: &Path) -> anyhow::Result<BourseConfig> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        BourseConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply environment overrides through `lookup`. Blank values are ignored.
pub fn apply_env_overrides(config: &mut BourseConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_blank(LEDGER_URL_ENV) {
        config.ledger.base_url = url;
    }
    if let Some(key) = non_blank(GEMINI_KEY_ENV) {
        config.llm.gemini_api_key = Some(key);
    }
}

/// Build the HTTP ledger client from configuration.
pub fn build_ledger(config: &BourseConfig) -> anyhow::Result<Arc<dyn Ledger>> {
    let ledger = HttpLedger::new(&config.ledger).context("Failed to build ledger client")?;
    info!(base_url = ledger.base_url(), "Ledger client ready");
    Ok(Arc::new(ledger))
}

/// Build an Orchestrator from configuration.
pub fn build_orchestrator(config: &BourseConfig) -> anyhow::Result<Arc<Orchestrator>> {
    let ledger = build_ledger(config)?;
    let llm = LlmRouter::from_config(&config.llm).context("Failed to build LLM backends")?;

    Ok(Arc::new(Orchestrator::new(
        ledger,
        llm,
        config.llm.default_model.clone(),
        config.orchestrator.clone(),
    )))
}

/// Persist a news event in the ledger, then run a news cycle linked to it.
///
/// If the ledger cannot store the event, the cycle still runs without an
/// event identifier.
pub async fn publish_news(
    orchestrator: &Orchestrator,
    headline: &str,
    content: &str,
) -> Result<CycleReport, AgentError> {
    let event_id = match orchestrator
        .ledger()
        .create_news_event(headline, content)
        .await
    {
        Ok(event) => {
            info!(event_id = %event.id, "News event stored");
            Some(event.id)
        }
        Err(e) => {
            warn!(error = %e, "Failed to store news event, continuing without identifier");
            None
        }
    };

    orchestrator
        .trigger_all_agents_with_news(headline, content, event_id)
        .await
}

/// Register a new agent. `model` falls back to `default_model` and must name
/// a supported provider.
pub async fn register_agent(
    ledger: &dyn Ledger,
    name: &str,
    persona: &str,
    model: Option<&str>,
    default_model: &str,
) -> anyhow::Result<AgentSummary> {
    let model = model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default_model);
    if ModelRoute::resolve(model).is_none() {
        bail!("Unsupported model '{model}': expected gemini-* or ollama/<name>");
    }
    if name.trim().is_empty() {
        bail!("Agent name must not be empty");
    }

    let agent = NewAgent {
        name: name.trim().to_string(),
        persona: persona.to_string(),
        model: model.to_string(),
    };
    let created = ledger
        .create_agent(&agent)
        .await
        .context("Failed to create agent")?;
    info!(agent_id = %created.id, model, "Agent created");
    Ok(created)
}
