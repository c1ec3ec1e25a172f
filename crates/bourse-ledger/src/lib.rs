pub mod client;
pub mod envelope;
pub mod error;
pub mod http;

pub use client::Ledger;
pub use error::LedgerError;
pub use http::HttpLedger;
