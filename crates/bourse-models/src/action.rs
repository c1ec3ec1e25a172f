use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decision::TradeAction;

/// Audit log entry for one agent's decision (`POST /agents/log`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub agent_id: String,
    pub insight: String,
    pub actions_taken: String,
    pub market_sentiment: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_worth_snapshot: Decimal,
    /// Originating news event, when the cycle was news-triggered.
    #[serde(
        rename = "newsEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub news_event: Option<String>,
}

/// Trade instruction (`POST /agents/buy` or `POST /agents/sell`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeOrder {
    pub agent_id: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
}

/// Request body for creating an agent (`POST /agents`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAgent {
    pub name: String,
    pub persona: String,
    pub model: String,
}

/// Everything the orchestrator may write to the ledger on an agent's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerAction {
    Log(AuditEntry),
    Buy(TradeOrder),
    Sell(TradeOrder),
}

impl LedgerAction {
    /// Build the trade submission for a BUY or SELL. HOLD has none.
    pub fn trade(action: TradeAction, order: TradeOrder) -> Option<Self> {
        match action {
            TradeAction::Buy => Some(Self::Buy(order)),
            TradeAction::Sell => Some(Self::Sell(order)),
            TradeAction::Hold => None,
        }
    }

    /// Path segment under `/agents/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Buy(_) => "buy",
            Self::Sell(_) => "sell",
        }
    }

    pub fn agent_id(&self) -> &str {
        match self {
            Self::Log(entry) => &entry.agent_id,
            Self::Buy(order) | Self::Sell(order) => &order.agent_id,
        }
    }

    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Log(entry) => serde_json::to_value(entry),
            Self::Buy(order) | Self::Sell(order) => serde_json::to_value(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> TradeOrder {
        TradeOrder {
            agent_id: "a1".to_string(),
            symbol: "WIPRO".to_string(),
            quantity: dec!(12),
        }
    }

    #[test]
    fn audit_entry_wire_shape() {
        let entry = AuditEntry {
            agent_id: "a1".to_string(),
            insight: "Rates are falling".to_string(),
            actions_taken: "Decision: BUY, Symbol: WIPRO, Quantity: 12".to_string(),
            market_sentiment: "Greedy".to_string(),
            net_worth_snapshot: dec!(150.25),
            news_event: Some("n9".to_string()),
        };

        let value = LedgerAction::Log(entry).payload().unwrap();
        assert_eq!(value["agentId"], "a1");
        assert_eq!(value["marketSentiment"], "Greedy");
        assert_eq!(value["netWorthSnapshot"], 150.25);
        assert_eq!(value["newsEvent"], "n9");
    }

    #[test]
    fn audit_entry_omits_missing_event() {
        let entry = AuditEntry {
            agent_id: "a1".to_string(),
            insight: String::new(),
            actions_taken: String::new(),
            market_sentiment: "Neutral".to_string(),
            net_worth_snapshot: dec!(1),
            news_event: None,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("newsEvent").is_none());
    }

    #[test]
    fn trade_order_quantity_is_numeric() {
        let value = LedgerAction::Buy(order()).payload().unwrap();
        assert_eq!(value, serde_json::json!({"agentId": "a1", "symbol": "WIPRO", "quantity": 12.0}));
    }

    #[test]
    fn trade_maps_actions_to_endpoints() {
        assert_eq!(
            LedgerAction::trade(TradeAction::Buy, order()).unwrap().endpoint(),
            "buy"
        );
        assert_eq!(
            LedgerAction::trade(TradeAction::Sell, order()).unwrap().endpoint(),
            "sell"
        );
        assert!(LedgerAction::trade(TradeAction::Hold, order()).is_none());
    }
}
