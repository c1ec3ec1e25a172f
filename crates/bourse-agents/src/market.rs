use bourse_ledger::Ledger;
use bourse_models::Instrument;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, error};

use crate::error::AgentError;

pub const MARKET_HEADER: &str = "Current Market Prices:";

/// Price snapshot shared by every agent in one cycle. Built fresh per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    instrument_count: usize,
    text: String,
}

impl MarketContext {
    /// None when there is nothing to trade.
    pub fn from_instruments(instruments: Vec<Instrument>) -> Option<Self> {
        if instruments.is_empty() {
            return None;
        }
        Some(Self {
            instrument_count: instruments.len(),
            text: render_market_context(&instruments),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn instrument_count(&self) -> usize {
        self.instrument_count
    }
}

/// Two-decimal money formatting, rounding half away from zero.
pub(crate) fn format_money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Header line, then `- <symbol>: $<price>` per instrument in listing order.
pub fn render_market_context(instruments: &[Instrument]) -> String {
    let mut lines = Vec::with_capacity(instruments.len() + 1);
    lines.push(MARKET_HEADER.to_string());
    lines.extend(
        instruments
            .iter()
            .map(|i| format!("- {}: ${}", i.symbol, format_money(i.price))),
    );
    lines.join("\n")
}

/// Fetch instruments from the ledger and render the cycle's market context.
///
/// Fails when the fetch fails or the ledger lists nothing; agents never run
/// without market context.
pub async fn build_market_context(ledger: &dyn Ledger) -> Result<MarketContext, AgentError> {
    let instruments = ledger.list_instruments().await.map_err(|e| {
        error!(error = %e, "Failed to fetch instruments");
        AgentError::from(e)
    })?;

    let context = MarketContext::from_instruments(instruments).ok_or(AgentError::NoMarketData)?;
    debug!(instruments = context.instrument_count(), "Built market context");
    Ok(context)
}
