use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_SENTIMENT: &str = "Neutral";
pub const DEFAULT_REASONING: &str = "No reasoning provided.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl TradeAction {
    /// Case-insensitive. Anything other than BUY or SELL is a HOLD.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            _ => Self::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(TradeAction::parse_lenient)
            .unwrap_or_default())
    }
}

/// One agent's decision for one cycle, as produced by the LLM.
///
/// Fields are kept as loose as the model's output: `quantity` stays the raw JSON
/// value and is only coerced when a trade is about to be submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(rename = "decision", default)]
    pub action: TradeAction,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub quantity: serde_json::Value,
}

impl Decision {
    pub fn sentiment(&self) -> &str {
        non_blank(self.emotion.as_deref()).unwrap_or(DEFAULT_SENTIMENT)
    }

    pub fn insight(&self) -> &str {
        non_blank(self.reasoning.as_deref()).unwrap_or(DEFAULT_REASONING)
    }

    /// Symbol to trade, if the model supplied a non-blank one.
    pub fn trade_symbol(&self) -> Option<&str> {
        non_blank(self.symbol.as_deref()).map(str::trim)
    }

    /// Quantity coerced to a number. Accepts JSON numbers and numeric strings.
    pub fn coerced_quantity(&self) -> Option<Decimal> {
        match &self.quantity {
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok(),
            serde_json::Value::String(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()
            }
            _ => None,
        }
    }

    /// Human-readable summary recorded in the audit log.
    pub fn summary(&self) -> String {
        let symbol = self.symbol.as_deref().unwrap_or("None");
        let quantity = match &self.quantity {
            serde_json::Value::Null => "None".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!(
            "Decision: {}, Symbol: {symbol}, Quantity: {quantity}",
            self.action
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
