use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event text for the scheduled market-open review.
pub const DAILY_REVIEW_TEXT: &str = "The market is open for trading. Review your portfolio \
     and the current market prices to make a decision.";

/// What triggered a decision cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketEvent {
    News {
        headline: String,
        content: String,
        /// Ledger identifier of the persisted news event, attached to audit logs.
        id: Option<String>,
    },
    /// Periodic review. Never carries an identifier.
    MarketOpen,
}

impl MarketEvent {
    pub fn news(headline: impl Into<String>, content: impl Into<String>, id: Option<String>) -> Self {
        Self::News {
            headline: headline.into(),
            content: content.into(),
            id,
        }
    }

    /// Event description as presented to the agents.
    pub fn description(&self) -> String {
        match self {
            Self::News {
                headline, content, ..
            } => format!(
                "A news event has just occurred: \"Headline: {headline}. Details: {content}\""
            ),
            Self::MarketOpen => DAILY_REVIEW_TEXT.to_string(),
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::News { id, .. } => id.as_deref(),
            Self::MarketOpen => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::News { .. } => "news",
            Self::MarketOpen => "market_open",
        }
    }
}

/// A news event persisted by the ledger (`POST /news`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsEvent {
    #[serde(rename = "_id")]
    pub id: String,
    pub headline: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<NewsEvent> for MarketEvent {
    fn from(event: NewsEvent) -> Self {
        MarketEvent::News {
            headline: event.headline,
            content: event.content,
            id: Some(event.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_description_quotes_headline_and_details() {
        let event = MarketEvent::news("RBI cuts rates", "Repo rate down 25bps", Some("n1".into()));
        assert_eq!(
            event.description(),
            "A news event has just occurred: \"Headline: RBI cuts rates. Details: Repo rate down 25bps\""
        );
        assert_eq!(event.event_id(), Some("n1"));
        assert_eq!(event.kind(), "news");
    }

    #[test]
    fn market_open_has_fixed_text_and_no_id() {
        let event = MarketEvent::MarketOpen;
        assert_eq!(event.description(), DAILY_REVIEW_TEXT);
        assert!(event.event_id().is_none());
        assert!(DAILY_REVIEW_TEXT.starts_with("The market is open for trading. Review"));
    }

    #[test]
    fn persisted_news_event_converts_with_id() {
        let stored: NewsEvent = serde_json::from_value(serde_json::json!({
            "_id": "66a0",
            "headline": "Chip shortage",
            "content": "Supply constrained",
            "createdAt": "2024-06-01T04:30:00.000Z",
            "__v": 0
        }))
        .unwrap();

        assert!(stored.created_at.is_some());
        let event: MarketEvent = stored.into();
        assert_eq!(event.event_id(), Some("66a0"));
    }
}
