use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradable instrument as listed by the ledger (`GET /stocks`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub price: Decimal,
}
