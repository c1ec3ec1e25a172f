use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Ledger rejected request: {0}")]
    Rejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger response missing data: {0}")]
    MissingData(String),
}
