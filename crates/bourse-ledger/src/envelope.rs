use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LedgerError;

/// The ledger wraps every response as `{"status": ..., "data": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `"status": "fail"` into an error.
    pub fn into_data(self) -> Result<Option<T>, LedgerError> {
        match self.status.as_deref() {
            Some("fail") | Some("error") => Err(LedgerError::Rejected(
                self.message
                    .unwrap_or_else(|| "no message from ledger".to_string()),
            )),
            _ => Ok(self.data),
        }
    }
}

/// Decode a successful response body. An empty body (e.g. 204) carries no data.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>, LedgerError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.into_data()
}

/// Best-effort extraction of the ledger's error message from a non-2xx body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}
