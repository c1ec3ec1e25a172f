use bourse_models::{AgentDetail, MarketEvent, Valuation};

use crate::market::{format_money, MarketContext};

/// Output schema every agent must answer with.
pub const DECISION_SCHEMA: &str = r#"{
    "emotion": "A single word describing your current sentiment (e.g., Cautious, Optimistic, Anxious, Greedy)",
    "reasoning": "A brief, one-sentence explanation for your decision.",
    "decision": "Your action: one of 'BUY', 'SELL', or 'HOLD'.",
    "symbol": "The stock symbol for your action. Provide null if HOLD.",
    "quantity": "The number of shares to trade. Provide 0 if HOLD."
}"#;

/// Natural-language description of the agent's open positions.
pub fn describe_holdings(agent: &AgentDetail) -> String {
    let holdings: Vec<String> = agent
        .open_holdings()
        .map(|h| {
            format!(
                "{} shares of {} (Avg. Buy Price: ${})",
                h.quantity.normalize(),
                h.symbol().unwrap_or("an unlisted stock"),
                format_money(h.average_buy_price)
            )
        })
        .collect();

    if holdings.is_empty() {
        "You currently hold no stocks.".to_string()
    } else {
        format!("Your current holdings are: {}.", holdings.join(", "))
    }
}

/// The decision prompt for one agent, without the output schema.
pub fn agent_prompt(
    agent: &AgentDetail,
    valuation: &Valuation,
    model_id: &str,
    market: &MarketContext,
    event: &MarketEvent,
) -> String {
    let persona = if agent.persona.trim().is_empty() {
        "N/A"
    } else {
        agent.persona.as_str()
    };

    format!(
        "You are a trading agent named '{name}'.\n\
         Your Persona: '{persona}'.\n\
         Your Model: {model_id}.\n\n\
         Your Financial Status:\n\
         - Cash Balance: ${balance}\n\
         - Portfolio Value: ${portfolio}\n\
         - Net Worth: ${net_worth}\n\
         - {holdings}\n\n\
         {market}\n\n\
         Market Event:\n\
         {event}\n\n\
         Task:\n\
         Based on your persona, your current holdings, your cash balance, and the provided \
         market data and event, decide whether to BUY, SELL, or HOLD.\n\
         - If you BUY, choose a stock from the list and specify a quantity you can afford \
         with your cash balance.\n\
         - If you SELL, choose a stock from your portfolio and specify a quantity you own.\n\
         - If you HOLD, you take no action.\n\
         - Be rational. Your goal is to maximize your net worth.",
        name = agent.name,
        balance = format_money(agent.balance),
        portfolio = format_money(valuation.portfolio_value),
        net_worth = format_money(valuation.net_worth),
        holdings = describe_holdings(agent),
        market = market.text(),
        event = event.description(),
    )
}

/// Append the strict output-schema instruction to a prompt.
pub fn with_output_schema(prompt: &str) -> String {
    format!("{prompt}\n\nRespond ONLY with a valid JSON object matching this schema:\n{DECISION_SCHEMA}")
}
