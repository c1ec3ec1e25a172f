pub mod action;
pub mod agent;
pub mod config;
pub mod decision;
pub mod event;
pub mod instrument;
pub mod routing;

pub use action::{AuditEntry, LedgerAction, NewAgent, TradeOrder};
pub use agent::{AgentDetail, AgentSummary, Holding, StockRef, Valuation};
pub use config::{BourseConfig, LedgerConfig, LlmConfig, OrchestratorConfig, ScheduleConfig};
pub use decision::{Decision, TradeAction};
pub use event::{MarketEvent, NewsEvent, DAILY_REVIEW_TEXT};
pub use instrument::Instrument;
pub use routing::ModelRoute;
