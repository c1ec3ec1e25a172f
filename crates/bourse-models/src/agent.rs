use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the ledger's agent roster (`GET /agents`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Full agent record (`GET /agents/{id}`), fetched fresh every cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub persona: String,
    /// Model identifier, e.g. `gemini-2.5-pro` or `ollama/tinyllama`.
    /// Older ledger records carry none; callers fall back to a configured default.
    #[serde(default)]
    pub model: Option<String>,
    pub balance: Decimal,
    #[serde(default)]
    pub portfolio: Vec<Holding>,
}

/// A position in an agent's portfolio, joined with the instrument's current price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// None when the ledger's instrument reference no longer resolves.
    #[serde(default)]
    pub stock: Option<StockRef>,
    pub quantity: Decimal,
    #[serde(default)]
    pub average_buy_price: Decimal,
}

/// The populated `stock` reference inside a holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRef {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Current price. None when the instrument is unpriced.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl Holding {
    /// Positions with zero or negative quantity are closed and ignored.
    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn symbol(&self) -> Option<&str> {
        self.stock
            .as_ref()
            .map(|s| s.symbol.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// quantity × current price. Missing or unpriced instruments are worth zero.
    /// None on overflow.
    pub fn market_value(&self) -> Option<Decimal> {
        let price = self
            .stock
            .as_ref()
            .and_then(|s| s.price)
            .unwrap_or(Decimal::ZERO);
        self.quantity.checked_mul(price)
    }
}

/// Portfolio value and net worth computed from one agent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub portfolio_value: Decimal,
    pub net_worth: Decimal,
}

impl AgentDetail {
    /// Holdings with a positive quantity, in ledger order.
    pub fn open_holdings(&self) -> impl Iterator<Item = &Holding> {
        self.portfolio.iter().filter(|h| h.is_open())
    }

    /// Sum of open positions at current prices. None on overflow.
    pub fn portfolio_value(&self) -> Option<Decimal> {
        self.open_holdings()
            .try_fold(Decimal::ZERO, |total, h| total.checked_add(h.market_value()?))
    }

    /// balance + portfolio value. None on overflow.
    pub fn net_worth(&self) -> Option<Decimal> {
        self.balance.checked_add(self.portfolio_value()?)
    }

    pub fn valuation(&self) -> Option<Valuation> {
        let portfolio_value = self.portfolio_value()?;
        Some(Valuation {
            portfolio_value,
            net_worth: self.balance.checked_add(portfolio_value)?,
        })
    }

    /// The agent's model identifier, or `default` when the record has none.
    pub fn model_id<'a>(&'a self, default: &'a str) -> &'a str {
        match self.model.as_deref() {
            Some(model) if !model.trim().is_empty() => model,
            _ => default,
        }
    }
}
