use std::fmt;
use std::sync::Arc;

use bourse_ledger::Ledger;
use bourse_models::{AuditEntry, Decision, LedgerAction, TradeAction, TradeOrder};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

/// Why an actionable decision did not reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSymbol,
    InvalidQuantity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSymbol => f.write_str("missing symbol"),
            Self::InvalidQuantity => f.write_str("quantity is not a positive number"),
        }
    }
}

/// What happened to one decision after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Held,
    Traded { action: TradeAction },
    Skipped { action: TradeAction, reason: SkipReason },
    TradeFailed { action: TradeAction, error: String },
}

/// Build the audit log entry for a decision.
pub fn audit_entry(
    agent_id: &str,
    decision: &Decision,
    net_worth: Decimal,
    event_id: Option<&str>,
) -> AuditEntry {
    AuditEntry {
        agent_id: agent_id.to_string(),
        insight: decision.insight().to_string(),
        actions_taken: decision.summary(),
        market_sentiment: decision.sentiment().to_string(),
        net_worth_snapshot: net_worth,
        news_event: event_id.map(str::to_string),
    }
}

/// Validate the trade fields of a BUY/SELL decision.
pub fn trade_order(agent_id: &str, decision: &Decision) -> Result<TradeOrder, SkipReason> {
    let symbol = decision.trade_symbol().ok_or(SkipReason::MissingSymbol)?;
    let quantity = decision
        .coerced_quantity()
        .filter(|q| *q > Decimal::ZERO)
        .ok_or(SkipReason::InvalidQuantity)?;

    Ok(TradeOrder {
        agent_id: agent_id.to_string(),
        symbol: symbol.to_string(),
        quantity,
    })
}

/// Forwards decisions to the ledger: an audit log always, a trade when actionable.
pub struct TradeDispatcher {
    ledger: Arc<dyn Ledger>,
}

impl TradeDispatcher {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Audit-log delivery is best-effort and never blocks the trade.
    pub async fn dispatch(
        &self,
        agent_id: &str,
        decision: &Decision,
        net_worth: Decimal,
        event_id: Option<&str>,
    ) -> DispatchOutcome {
        let log = LedgerAction::Log(audit_entry(agent_id, decision, net_worth, event_id));
        if let Err(e) = self.ledger.submit_action(&log).await {
            warn!(agent_id, error = %e, "Failed to submit audit log");
        }

        let action = decision.action;
        if !action.is_trade() {
            return DispatchOutcome::Held;
        }

        let order = match trade_order(agent_id, decision) {
            Ok(order) => order,
            Err(reason) => {
                warn!(
                    agent_id,
                    %action,
                    %reason,
                    "Agent provided invalid symbol or quantity. Skipping trade."
                );
                return DispatchOutcome::Skipped { action, reason };
            }
        };

        let Some(trade) = LedgerAction::trade(action, order) else {
            return DispatchOutcome::Held;
        };

        match self.ledger.submit_action(&trade).await {
            Ok(()) => {
                info!(agent_id, %action, "Trade submitted");
                DispatchOutcome::Traded { action }
            }
            Err(e) => {
                error!(agent_id, %action, error = %e, "Trade submission failed");
                DispatchOutcome::TradeFailed {
                    action,
                    error: e.to_string(),
                }
            }
        }
    }
}
